//! # launchpad-agent
//!
//! The [`LlmAgent`] tool-calling loop and [`FunctionTool`], a closure-backed
//! [`launchpad_core::Tool`].
//!
//! ```rust,ignore
//! let agent = LlmAgentBuilder::new("root_agent")
//!     .description("Answers questions about the time")
//!     .model(model)
//!     .instruction("Use get_current_time when asked about the time.")
//!     .tool(Arc::new(time_tool))
//!     .build()?;
//! ```

mod function_tool;
mod llm_agent;

pub use function_tool::FunctionTool;
pub use llm_agent::{DEFAULT_MAX_ITERATIONS, LlmAgent, LlmAgentBuilder};
