mod auth;
mod backend;
mod client;
pub mod wire;

pub use auth::{AccessTokenSource, GcloudTokenSource};
pub use backend::{
    DEFAULT_LOCATION, ENV_API_KEY, ENV_LOCATION, ENV_PROJECT, ENV_USE_VERTEX, GeminiBackend,
    STUDIO_BASE_URL,
};
pub use client::GeminiModel;
