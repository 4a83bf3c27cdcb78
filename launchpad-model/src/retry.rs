use launchpad_core::{LaunchpadError, Result};
use std::{future::Future, time::Duration};

/// Back-off policy for transient Gemini failures.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f32) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }
}

#[must_use]
pub fn is_retryable_status_code(status_code: u16) -> bool {
    matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504)
}

/// A failed request attempt. Only `retryable` attempts are tried again; the
/// inner error is what callers see once retries run out.
#[derive(Debug)]
pub struct RequestError {
    pub error: LaunchpadError,
    pub retryable: bool,
}

impl RequestError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { error: LaunchpadError::Model(message.into()), retryable: true }
    }

    pub fn permanent(error: LaunchpadError) -> Self {
        Self { error, retryable: false }
    }
}

impl From<LaunchpadError> for RequestError {
    fn from(error: LaunchpadError) -> Self {
        Self::permanent(error)
    }
}

fn next_retry_delay(current: Duration, retry_config: &RetryConfig) -> Duration {
    if current >= retry_config.max_delay {
        return retry_config.max_delay;
    }

    let multiplier = retry_config.backoff_multiplier.max(1.0) as f64;
    let scaled = Duration::from_secs_f64(current.as_secs_f64() * multiplier);
    scaled.min(retry_config.max_delay)
}

pub async fn execute_with_retry<T, Op, Fut>(
    retry_config: &RetryConfig,
    mut operation: Op,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    if !retry_config.enabled {
        return operation().await.map_err(|e| e.error);
    }

    let mut attempt: u32 = 0;
    let mut delay = retry_config.initial_delay;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(failure) if failure.retryable && attempt < retry_config.max_retries => {
                attempt += 1;
                launchpad_telemetry::warn!(
                    attempt = attempt,
                    max_retries = retry_config.max_retries,
                    delay_ms = delay.as_millis(),
                    error = %failure.error,
                    "Gemini request failed with retryable error; retrying"
                );
                tokio::time::sleep(delay).await;
                delay = next_retry_delay(delay, retry_config);
            }
            Err(failure) => return Err(failure.error),
        }
    }
}
