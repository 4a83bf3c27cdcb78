//! # Launchpad Telemetry
//!
//! Structured logging for Launchpad binaries, built on `tracing`.
//!
//! ```rust
//! use launchpad_telemetry::{init_telemetry, info};
//!
//! init_telemetry("launchpad", "warn");
//! info!("ready");
//! ```

pub mod init;

// Re-export tracing macros for convenience
pub use tracing::{Span, debug, error, info, instrument, trace, warn};

pub use init::{DEFAULT_LEVEL, build_filter, init_telemetry};
