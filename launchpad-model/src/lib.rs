//! # launchpad-model
//!
//! Gemini model access for Launchpad agents.
//!
//! [`GeminiModel`] implements [`launchpad_core::Llm`] on top of the
//! `generateContent` REST endpoint. The backend is either Google AI Studio
//! (API key) or Vertex AI (Application Default Credentials via `gcloud`).
//!
//! ```rust,ignore
//! use launchpad_model::{GeminiBackend, GeminiModel};
//!
//! let model = GeminiModel::new(GeminiBackend::from_env()?, "gemini-2.5-flash")?;
//! ```
//!
//! Transient failures (408, 429 and 5xx responses, timeouts) are retried with
//! exponential back-off; see [`RetryConfig`].

pub mod gemini;
pub mod retry;

pub use gemini::{AccessTokenSource, GcloudTokenSource, GeminiBackend, GeminiModel};
pub use retry::RetryConfig;
