use async_trait::async_trait;
use launchpad_core::{LaunchpadError, Result};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Supplies OAuth bearer tokens for Vertex AI.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    fetched_at: Instant,
}

/// Asks `gcloud auth application-default print-access-token` for a token and
/// reuses it until it is close to expiry.
#[derive(Debug)]
pub struct GcloudTokenSource {
    program: String,
    lifetime: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl Default for GcloudTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GcloudTokenSource {
    pub fn new() -> Self {
        // ADC tokens live for an hour.
        Self {
            program: "gcloud".to_string(),
            lifetime: Duration::from_secs(50 * 60),
            cached: Mutex::new(None),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn fetch(&self) -> Result<String> {
        let output = tokio::process::Command::new(&self.program)
            .args(["auth", "application-default", "print-access-token"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LaunchpadError::Model(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(LaunchpadError::Model(format!(
                "could not obtain an access token (run `gcloud auth application-default login`): {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(LaunchpadError::Model("gcloud printed an empty access token".to_string()));
        }
        Ok(token)
    }
}

#[async_trait]
impl AccessTokenSource for GcloudTokenSource {
    async fn access_token(&self) -> Result<String> {
        let mut cache = self.cached.lock().await;
        if let Some(cached) = cache.as_ref().filter(|t| t.fetched_at.elapsed() < self.lifetime) {
            return Ok(cached.token.clone());
        }

        launchpad_telemetry::debug!("fetching access token from gcloud");
        let token = self.fetch().await?;
        *cache = Some(CachedToken { token: token.clone(), fetched_at: Instant::now() });
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_gcloud_is_model_error() {
        let source = GcloudTokenSource::new().with_program("launchpad-no-such-gcloud");
        let err = source.access_token().await.unwrap_err();
        assert!(
            matches!(err, LaunchpadError::Model(ref m) if m.contains("launchpad-no-such-gcloud"))
        );
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let source = GcloudTokenSource::new().with_program("launchpad-no-such-gcloud");
        *source.cached.lock().await =
            Some(CachedToken { token: "cached".into(), fetched_at: Instant::now() });
        assert_eq!(source.access_token().await.unwrap(), "cached");
    }
}
