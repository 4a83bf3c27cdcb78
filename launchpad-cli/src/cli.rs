use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::tutorial;

#[derive(Parser, Debug)]
#[command(name = "launchpad", version)]
#[command(about = "Prepare, deploy and talk to a Gemini agent on Cloud Run", long_about = None)]
pub struct Cli {
    /// Environment file holding the deployment settings
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Project directory the external tools run in
    #[arg(long, global = true, default_value = ".")]
    pub workdir: PathBuf,

    /// Print external commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = launchpad_telemetry::DEFAULT_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The env file path, relative paths taken from `--workdir`.
    pub fn env_path(&self) -> PathBuf {
        if self.env_file.is_absolute() {
            self.env_file.clone()
        } else {
            self.workdir.join(&self.env_file)
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an environment file template
    Init(InitArgs),

    /// Check the toolchain and the deployment configuration
    Doctor,

    /// Initialise gcloud and create application default credentials
    Auth {
        /// Skip `gcloud init` on an already initialised machine
        #[arg(long)]
        no_init: bool,

        /// Store the active gcloud project in the environment file
        #[arg(long)]
        save_project: bool,
    },

    /// Add deployment scaffolding and install dependencies
    Scaffold,

    /// Deploy the agent to Cloud Run
    Deploy(DeployArgs),

    /// Authenticate, scaffold and deploy in one go
    Up {
        #[arg(long)]
        skip_auth: bool,

        #[arg(long)]
        skip_scaffold: bool,

        /// Skip `gcloud init`
        #[arg(long)]
        no_init: bool,

        #[command(flatten)]
        deploy: DeployArgs,
    },

    /// Run the tutorial conversation against the agent
    Chat {
        #[arg(long, default_value = tutorial::DEFAULT_USER_ID)]
        user_id: String,

        #[arg(long, default_value = tutorial::DEFAULT_SESSION_ID)]
        session_id: String,

        /// Gemini model name
        #[arg(long, env = "LAUNCHPAD_MODEL", default_value = tutorial::DEFAULT_MODEL)]
        model: String,

        /// Queries to send; the tutorial questions when omitted
        queries: Vec<String>,
    },

    /// Talk to the agent interactively
    Console {
        #[arg(long, default_value = tutorial::DEFAULT_USER_ID)]
        user_id: String,

        /// Gemini model name
        #[arg(long, env = "LAUNCHPAD_MODEL", default_value = tutorial::DEFAULT_MODEL)]
        model: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,

    #[arg(long)]
    pub project: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub service_name: Option<String>,

    #[arg(long)]
    pub app_name: Option<String>,

    #[arg(long)]
    pub agent_path: Option<String>,

    /// Use Vertex AI instead of an AI Studio API key
    #[arg(long)]
    pub vertex: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Port the deployed server listens on
    #[arg(long)]
    pub port: Option<u16>,

    /// Serve the ADK web UI alongside the API
    #[arg(long)]
    pub with_ui: bool,

    /// Send traces to Cloud Trace
    #[arg(long)]
    pub trace_to_cloud: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_env_file_resolves_against_workdir() {
        let cli = Cli::parse_from(["launchpad", "--workdir", "/srv/agent", "doctor"]);
        assert_eq!(cli.env_path(), PathBuf::from("/srv/agent/.env"));

        let cli = Cli::parse_from(["launchpad", "--env-file", "/etc/agent.env", "doctor"]);
        assert_eq!(cli.env_path(), PathBuf::from("/etc/agent.env"));
    }

    #[test]
    fn test_up_flags() {
        let cli = Cli::parse_from(["launchpad", "up", "--no-init", "--with-ui", "--port", "8080"]);
        match cli.command {
            Commands::Up { no_init, skip_auth, deploy, .. } => {
                assert!(no_init);
                assert!(!skip_auth);
                assert!(deploy.with_ui);
                assert_eq!(deploy.port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_chat_queries_are_positional() {
        let cli =
            Cli::parse_from(["launchpad", "chat", "--model", "gemini-2.5-flash", "hello", "bye"]);
        match cli.command {
            Commands::Chat { queries, model, user_id, .. } => {
                assert_eq!(queries, vec!["hello", "bye"]);
                assert_eq!(model, "gemini-2.5-flash");
                assert_eq!(user_id, "user_1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
