//! # launchpad-runner
//!
//! Executes an agent inside a stored session.
//!
//! [`Runner::run`] loads the session, stores the user message, runs the root
//! agent with the conversation so far and stores each event it produces.
//! [`ensure_session`] and [`call_agent`] wrap the common "ask one question,
//! print the answer" flow.

mod context;
mod conversation;
mod runner;

pub use context::InvocationContext;
pub use conversation::{
    NO_ESCALATION_MESSAGE, NO_FINAL_RESPONSE, SessionStatus, call_agent, ensure_session,
};
pub use runner::Runner;
