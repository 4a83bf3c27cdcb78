use crate::command::CommandSpec;
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const STARTER_PACK: &str = "agent-starter-pack";
pub const STARTER_PACK_TARGET: &str = "agent_engine";

/// External steps, declared in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    GcloudInit,
    ApplicationDefaultLogin,
    ResolveProject,
    Scaffold,
    Sync,
    Deploy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Auth,
    Scaffold,
    Deploy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    pub port: Option<u16>,
    pub with_ui: bool,
    pub trace_to_cloud: bool,
}

/// Everything a step needs to build its command.
#[derive(Debug, Clone)]
pub struct DeployContext {
    pub workdir: PathBuf,
    pub config: Option<DeployConfig>,
    pub options: DeployOptions,
    /// Project captured from `gcloud config get-value project`.
    pub resolved_project: Option<String>,
    pub verify_agent_path: bool,
}

impl DeployContext {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            config: None,
            options: DeployOptions::default(),
            resolved_project: None,
            verify_agent_path: true,
        }
    }

    pub fn with_config(mut self, config: DeployConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_options(mut self, options: DeployOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_verify_agent_path(mut self, verify: bool) -> Self {
        self.verify_agent_path = verify;
        self
    }

    /// The project gcloud reported, falling back to the configured one.
    pub fn project(&self) -> Option<&str> {
        self.resolved_project
            .as_deref()
            .or_else(|| self.config.as_ref().and_then(|c| c.project.as_deref()))
    }
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::GcloudInit,
        Step::ApplicationDefaultLogin,
        Step::ResolveProject,
        Step::Scaffold,
        Step::Sync,
        Step::Deploy,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Step::GcloudInit => "gcloud-init",
            Step::ApplicationDefaultLogin => "adc-login",
            Step::ResolveProject => "resolve-project",
            Step::Scaffold => "scaffold",
            Step::Sync => "uv-sync",
            Step::Deploy => "deploy",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Step::GcloudInit => "Initialise the gcloud CLI",
            Step::ApplicationDefaultLogin => "Create application default credentials",
            Step::ResolveProject => "Read the active Google Cloud project",
            Step::Scaffold => "Add deployment scaffolding with agent-starter-pack",
            Step::Sync => "Install project dependencies",
            Step::Deploy => "Deploy the agent to Cloud Run",
        }
    }

    pub fn command(&self, ctx: &DeployContext) -> Result<CommandSpec> {
        let spec = match self {
            Step::GcloudInit => CommandSpec::new("gcloud").arg("init"),
            Step::ApplicationDefaultLogin => {
                CommandSpec::new("gcloud").args(["auth", "application-default", "login"])
            }
            Step::ResolveProject => {
                CommandSpec::new("gcloud").args(["config", "get-value", "project"]).captured()
            }
            Step::Scaffold => CommandSpec::new("uvx")
                .args([STARTER_PACK, "enhance", "--adk", "-d", STARTER_PACK_TARGET])
                .current_dir(&ctx.workdir),
            Step::Sync => CommandSpec::new("uv").arg("sync").current_dir(&ctx.workdir),
            Step::Deploy => deploy_command(ctx)?,
        };
        Ok(spec)
    }
}

fn deploy_command(ctx: &DeployContext) -> Result<CommandSpec> {
    let config = ctx.config.as_ref().ok_or_else(|| {
        DeployError::InvalidConfig(vec!["deploy configuration was not loaded".to_string()])
    })?;
    let project = ctx.project().ok_or(DeployError::ProjectUnresolved)?;

    let mut spec = CommandSpec::new("uv")
        .args(["run", "adk", "deploy", "cloud_run"])
        .args(["--project", project])
        .args(["--region", config.location.as_str()])
        .args(["--service_name", config.service_name.as_str()])
        .args(["--app_name", config.app_name.as_str()]);
    if let Some(port) = ctx.options.port {
        spec = spec.arg("--port").arg(port.to_string());
    }
    if ctx.options.with_ui {
        spec = spec.arg("--with_ui");
    }
    if ctx.options.trace_to_cloud {
        spec = spec.arg("--trace_to_cloud");
    }
    Ok(spec.arg(config.agent_path.to_string_lossy()).current_dir(&ctx.workdir))
}

impl Stage {
    pub fn steps(&self) -> &'static [Step] {
        match self {
            Stage::Auth => &[Step::GcloudInit, Step::ApplicationDefaultLogin, Step::ResolveProject],
            Stage::Scaffold => &[Step::Scaffold, Step::Sync],
            Stage::Deploy => &[Step::Deploy],
        }
    }
}

/// An ordered, duplicate-free selection of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn for_stages(stages: &[Stage]) -> Self {
        let set: BTreeSet<Step> = stages.iter().flat_map(|s| s.steps().iter().copied()).collect();
        Self { steps: set.into_iter().collect() }
    }

    pub fn all() -> Self {
        Self { steps: Step::ALL.to_vec() }
    }

    pub fn without(mut self, step: Step) -> Self {
        self.steps.retain(|s| *s != step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn contains(&self, step: Step) -> bool {
        self.steps.contains(&step)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DeployConfig {
        DeployConfig {
            project: Some("configured-proj".into()),
            location: "us-central1".into(),
            service_name: "halloween-agent".into(),
            app_name: "halloween_app".into(),
            agent_path: PathBuf::from("./my_agent"),
            use_vertex: false,
            api_key: Some("key".into()),
        }
    }

    #[test]
    fn test_plan_orders_and_dedups() {
        let plan = Plan::for_stages(&[Stage::Deploy, Stage::Auth, Stage::Deploy]);
        assert_eq!(
            plan.steps(),
            &[Step::GcloudInit, Step::ApplicationDefaultLogin, Step::ResolveProject, Step::Deploy]
        );
        assert_eq!(Plan::for_stages(&[Stage::Auth, Stage::Scaffold, Stage::Deploy]), Plan::all());
    }

    #[test]
    fn test_plan_without() {
        let plan = Plan::all().without(Step::GcloudInit);
        assert!(!plan.contains(Step::GcloudInit));
        assert_eq!(plan.steps().len(), 5);
        assert!(Plan::for_stages(&[]).is_empty());
    }

    #[test]
    fn test_fixed_commands() {
        let ctx = DeployContext::new("/work");
        let rendered: Vec<String> = [
            Step::GcloudInit,
            Step::ApplicationDefaultLogin,
            Step::ResolveProject,
            Step::Scaffold,
            Step::Sync,
        ]
        .iter()
        .map(|s| s.command(&ctx).unwrap().to_string())
        .collect();
        assert_eq!(
            rendered,
            vec![
                "gcloud init",
                "gcloud auth application-default login",
                "gcloud config get-value project",
                "uvx agent-starter-pack enhance --adk -d agent_engine",
                "uv sync",
            ]
        );
        assert!(Step::ResolveProject.command(&ctx).unwrap().capture);
        assert_eq!(Step::Sync.command(&ctx).unwrap().cwd, Some(PathBuf::from("/work")));
    }

    #[test]
    fn test_deploy_command_arguments() {
        let ctx = DeployContext::new(".").with_config(config());
        assert_eq!(
            Step::Deploy.command(&ctx).unwrap().to_string(),
            "uv run adk deploy cloud_run --project configured-proj --region us-central1 \
             --service_name halloween-agent --app_name halloween_app ./my_agent"
        );
    }

    #[test]
    fn test_deploy_command_options_and_resolved_project() {
        let mut ctx = DeployContext::new(".").with_config(config()).with_options(DeployOptions {
            port: Some(8080),
            with_ui: true,
            trace_to_cloud: true,
        });
        ctx.resolved_project = Some("gcloud-proj".into());
        assert_eq!(
            Step::Deploy.command(&ctx).unwrap().to_string(),
            "uv run adk deploy cloud_run --project gcloud-proj --region us-central1 \
             --service_name halloween-agent --app_name halloween_app --port 8080 --with_ui \
             --trace_to_cloud ./my_agent"
        );
    }

    #[test]
    fn test_deploy_without_project_or_config() {
        let mut cfg = config();
        cfg.project = None;
        let ctx = DeployContext::new(".").with_config(cfg);
        assert!(matches!(Step::Deploy.command(&ctx), Err(DeployError::ProjectUnresolved)));

        let bare = DeployContext::new(".");
        assert!(matches!(Step::Deploy.command(&bare), Err(DeployError::InvalidConfig(_))));
    }

    #[test]
    fn test_step_ids_are_unique() {
        let ids: BTreeSet<&str> = Step::ALL.iter().map(Step::id).collect();
        assert_eq!(ids.len(), Step::ALL.len());
    }
}
