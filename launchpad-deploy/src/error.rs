use std::path::PathBuf;

/// Exit status used for configuration problems detected before any step runs.
pub const EXIT_CONFIG: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("{origin}:{line}: {message}")]
    EnvParse { origin: String, line: usize, message: String },

    #[error("{} already exists (use --force to overwrite)", .0.display())]
    EnvFileExists(PathBuf),

    #[error("invalid deploy configuration:\n  - {}", .0.join("\n  - "))]
    InvalidConfig(Vec<String>),

    #[error(
        "could not determine the Google Cloud project: set GOOGLE_CLOUD_PROJECT or run `gcloud config set project <id>`"
    )]
    ProjectUnresolved,

    #[error("required tools are missing: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("step `{step}` failed ({})", describe_exit(.code))]
    StepFailed { step: &'static str, code: Option<i32> },

    #[error("failed to load environment file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl DeployError {
    /// Process exit status a CLI should report for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::StepFailed { code: Some(code), .. } if *code != 0 => *code,
            DeployError::EnvParse { .. }
            | DeployError::EnvFileExists(_)
            | DeployError::InvalidConfig(_)
            | DeployError::ProjectUnresolved
            | DeployError::MissingTools(_)
            | DeployError::Dotenv(_) => EXIT_CONFIG,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
