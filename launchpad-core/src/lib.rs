//! # launchpad-core
//!
//! Core traits and types shared by the Launchpad agent runtime.
//!
//! ## Overview
//!
//! - [`Agent`] - anything that turns an invocation into a stream of [`Event`]s
//! - [`Tool`] - a function the model may call
//! - [`Llm`] - a model backend
//! - [`LaunchpadError`] / [`Result`] - unified error handling
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Tool: Send + Sync {
//!     fn name(&self) -> &str;
//!     fn description(&self) -> &str;
//!     async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value>;
//! }
//! ```
//!
//! ## State Management
//!
//! Session state keys use scope prefixes:
//!
//! - `app:` - shared by every session of an application
//! - `user:` - shared by every session of a user
//! - `temp:` - never persisted

pub mod agent;
pub mod error;
pub mod event;
pub mod model;
pub mod tool;
pub mod types;

pub use agent::{Agent, EventStream, InvocationContext};
pub use error::{LaunchpadError, Result};
pub use event::{Event, EventActions, KEY_PREFIX_APP, KEY_PREFIX_TEMP, KEY_PREFIX_USER};
pub use model::{FinishReason, FunctionDeclaration, Llm, LlmRequest, LlmResponse, UsageMetadata};
pub use tool::{Tool, ToolContext};
pub use types::{Content, Part};
