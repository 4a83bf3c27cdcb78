use super::auth::{AccessTokenSource, GcloudTokenSource};
use super::backend::GeminiBackend;
use super::wire::{GenerateContentRequest, GenerateContentResponse};
use crate::retry::{RequestError, RetryConfig, execute_with_retry, is_retryable_status_code};
use async_trait::async_trait;
use launchpad_core::{LaunchpadError, Llm, LlmRequest, LlmResponse, Result};
use std::sync::Arc;

/// Gemini `generateContent` over REST, against AI Studio or Vertex AI.
pub struct GeminiModel {
    http: reqwest::Client,
    backend: GeminiBackend,
    model_name: String,
    retry_config: RetryConfig,
    tokens: Option<Arc<dyn AccessTokenSource>>,
}

impl GeminiModel {
    pub fn new(backend: GeminiBackend, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LaunchpadError::Model(format!("failed to build HTTP client: {e}")))?;

        let tokens: Option<Arc<dyn AccessTokenSource>> = if backend.is_vertex() {
            Some(Arc::new(GcloudTokenSource::new()))
        } else {
            None
        };

        Ok(Self {
            http,
            backend,
            model_name: model.into(),
            retry_config: RetryConfig::default(),
            tokens,
        })
    }

    /// Builds a model from `GOOGLE_*` environment variables.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        Self::new(GeminiBackend::from_env()?, model)
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Replaces the bearer token source used for Vertex AI.
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn AccessTokenSource>) -> Self {
        self.tokens = Some(source);
        self
    }

    pub fn backend(&self) -> &GeminiBackend {
        &self.backend
    }

    async fn send_once(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, RequestError> {
        let mut request = self.http.post(url).json(body);
        match &self.backend {
            GeminiBackend::Studio { api_key, .. } => {
                request = request.header("x-goog-api-key", api_key);
            }
            GeminiBackend::Vertex { .. } => {
                if let Some(tokens) = &self.tokens {
                    request = request.bearer_auth(tokens.access_token().await?);
                }
            }
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                RequestError::transient(format!("Gemini request failed: {e}"))
            } else {
                LaunchpadError::Model(format!("Gemini request failed: {e}")).into()
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let message = format!("Gemini API error (HTTP {}): {}", status.as_u16(), detail.trim());
            return Err(if is_retryable_status_code(status.as_u16()) {
                RequestError::transient(message)
            } else {
                LaunchpadError::Model(message).into()
            });
        }

        response.json::<GenerateContentResponse>().await.map_err(|e| {
            LaunchpadError::Model(format!("failed to decode Gemini response: {e}")).into()
        })
    }
}

#[async_trait]
impl Llm for GeminiModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate_content(&self, req: LlmRequest) -> Result<LlmResponse> {
        let model =
            if req.model.is_empty() { self.model_name.as_str() } else { req.model.as_str() };
        let url = self.backend.endpoint(model);
        let body = GenerateContentRequest::from(&req);

        launchpad_telemetry::debug!(
            model,
            contents = body.contents.len(),
            tools = req.tools.len(),
            "calling generateContent"
        );

        let url = url.as_str();
        let body = &body;
        let response =
            execute_with_retry(&self.retry_config, move || self.send_once(url, body)).await?;

        Ok(LlmResponse::from(response))
    }
}
