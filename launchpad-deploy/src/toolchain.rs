//! Detection of the command-line tools the runbook shells out to.

use crate::command::{CommandExecutor, CommandSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    pub name: &'static str,
    pub version_args: &'static [&'static str],
    pub install_hint: &'static str,
    /// Optional tools are reported but do not make the toolchain unready.
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolState {
    Installed { version: String },
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub requirement: ToolRequirement,
    pub state: ToolState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainReport {
    pub tools: Vec<ToolStatus>,
}

impl ToolRequirement {
    pub fn version_command(&self) -> CommandSpec {
        CommandSpec::new(self.name).args(self.version_args.iter().copied()).captured()
    }
}

pub fn default_requirements() -> Vec<ToolRequirement> {
    vec![
        ToolRequirement {
            name: "uv",
            version_args: &["--version"],
            install_hint: "curl -LsSf https://astral.sh/uv/install.sh | sh",
            optional: false,
        },
        ToolRequirement {
            name: "gcloud",
            version_args: &["--version"],
            install_hint: "https://cloud.google.com/sdk/docs/install",
            optional: false,
        },
        ToolRequirement {
            name: "make",
            version_args: &["--version"],
            install_hint: "install it with your OS package manager (e.g. `apt install make`)",
            optional: true,
        },
    ]
}

impl ToolchainReport {
    pub fn is_ready(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn missing_required(&self) -> Vec<&ToolRequirement> {
        self.tools
            .iter()
            .filter(|t| t.state == ToolState::Missing && !t.requirement.optional)
            .map(|t| &t.requirement)
            .collect()
    }

    pub fn missing_names(&self) -> Vec<String> {
        self.missing_required().iter().map(|r| r.name.to_string()).collect()
    }
}

/// Runs each requirement's version command. Launch failures and non-zero
/// exits both count as missing.
pub async fn check_toolchain(
    executor: &dyn CommandExecutor,
    requirements: &[ToolRequirement],
) -> ToolchainReport {
    let mut tools = Vec::with_capacity(requirements.len());

    for requirement in requirements {
        let state = match executor.run(&requirement.version_command()).await {
            Ok(output) if output.success() => {
                let version = output
                    .stdout
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .unwrap_or("unknown")
                    .to_string();
                tracing::debug!(tool = requirement.name, %version, "tool found");
                ToolState::Installed { version }
            }
            Ok(output) => {
                tracing::debug!(
                    tool = requirement.name,
                    code = ?output.code,
                    "version check failed"
                );
                ToolState::Missing
            }
            Err(e) => {
                tracing::debug!(tool = requirement.name, error = %e, "tool not found");
                ToolState::Missing
            }
        };
        tools.push(ToolStatus { requirement: requirement.clone(), state });
    }

    ToolchainReport { tools }
}
