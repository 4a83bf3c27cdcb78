//! # launchpad-deploy
//!
//! Everything needed to take an agent project from a fresh machine to a
//! running Cloud Run service:
//!
//! - [`env`] - the `.env` file the whole flow is configured from
//! - [`config`] - validated deployment settings resolved from that file
//! - [`toolchain`] - checks for `uv`, `gcloud` and `make`
//! - [`steps`] - the external commands, in the order they must run
//! - [`runbook`] - the sequential executor that stops at the first failure
//!
//! The external tools are invoked, never reimplemented. Their output goes
//! straight to the terminal.
//!
//! ```rust,no_run
//! use launchpad_deploy::{DeployContext, Plan, ProcessExecutor, Runbook, Stage};
//! use std::sync::Arc;
//!
//! # async fn demo() -> launchpad_deploy::Result<()> {
//! let runbook = Runbook::new(Arc::new(ProcessExecutor));
//! let mut ctx = DeployContext::new(".");
//! runbook.execute(&Plan::for_stages(&[Stage::Auth]), &mut ctx).await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod runbook;
pub mod steps;
pub mod toolchain;

pub use command::{CommandExecutor, CommandOutput, CommandSpec, DryRunExecutor, ProcessExecutor};
pub use config::DeployConfig;
pub use env::{EnvEntry, EnvFile, EnvLine, TemplateValues};
pub use error::{DeployError, Result};
pub use runbook::{RunReport, Runbook};
pub use steps::{DeployContext, DeployOptions, Plan, Stage, Step};
pub use toolchain::{ToolRequirement, ToolState, ToolStatus, ToolchainReport, check_toolchain};
