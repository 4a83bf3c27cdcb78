use launchpad_core::{LaunchpadError, Result};
use std::fmt;

pub const ENV_USE_VERTEX: &str = "GOOGLE_GENAI_USE_VERTEXAI";
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const ENV_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";

pub const STUDIO_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Where `generateContent` requests go and how they authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum GeminiBackend {
    /// Google AI Studio, authenticated with an API key header.
    Studio { api_key: String, base_url: String },
    /// Vertex AI, authenticated with an OAuth bearer token.
    Vertex { project: String, location: String },
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeminiBackend::Studio { base_url, .. } => f
                .debug_struct("Studio")
                .field("api_key", &"<redacted>")
                .field("base_url", base_url)
                .finish(),
            GeminiBackend::Vertex { project, location } => f
                .debug_struct("Vertex")
                .field("project", project)
                .field("location", location)
                .finish(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

impl GeminiBackend {
    pub fn studio(api_key: impl Into<String>) -> Self {
        GeminiBackend::Studio { api_key: api_key.into(), base_url: STUDIO_BASE_URL.to_string() }
    }

    pub fn vertex(project: impl Into<String>, location: impl Into<String>) -> Self {
        GeminiBackend::Vertex { project: project.into(), location: location.into() }
    }

    /// Points a Studio backend at another host. No-op for Vertex.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let GeminiBackend::Studio { base_url, .. } = &mut self {
            *base_url = url.into();
        }
        self
    }

    /// Picks the backend from the usual Google environment variables.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if get(ENV_USE_VERTEX).is_some_and(|v| is_truthy(&v)) {
            let project = get(ENV_PROJECT).ok_or_else(|| {
                LaunchpadError::Config(format!(
                    "{ENV_PROJECT} is required when {ENV_USE_VERTEX} is set"
                ))
            })?;
            let location = get(ENV_LOCATION).unwrap_or_else(|| DEFAULT_LOCATION.to_string());
            Ok(Self::vertex(project, location))
        } else {
            let api_key = get(ENV_API_KEY).ok_or_else(|| {
                LaunchpadError::Config(format!(
                    "{ENV_API_KEY} is not set (or set {ENV_USE_VERTEX}=TRUE to use Vertex AI)"
                ))
            })?;
            Ok(Self::studio(api_key))
        }
    }

    /// Reads the backend from this process's environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn endpoint(&self, model: &str) -> String {
        let model = model.trim_start_matches("models/");
        match self {
            GeminiBackend::Studio { base_url, .. } => {
                format!("{}/models/{model}:generateContent", base_url.trim_end_matches('/'))
            }
            GeminiBackend::Vertex { project, location } => format!(
                "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
            ),
        }
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self, GeminiBackend::Vertex { .. })
    }
}
