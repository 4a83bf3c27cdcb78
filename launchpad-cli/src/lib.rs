//! # launchpad-cli
//!
//! The `launchpad` command: write the deployment `.env`, check the local
//! toolchain, run the gcloud / agent-starter-pack / `adk deploy` runbook and
//! talk to the tutorial agent.
//!
//! ```text
//! launchpad init --project my-proj --service-name halloween-agent --app-name halloween_app
//! launchpad doctor
//! launchpad up --no-init
//! launchpad chat "What is time in Rotterdam?"
//! ```

pub mod cli;
pub mod commands;
pub mod console;
pub mod tutorial;

pub use cli::{Cli, Commands};
pub use commands::{exit_code_for, run};
