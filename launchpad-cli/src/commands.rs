use crate::cli::{Cli, Commands, DeployArgs, InitArgs};
use crate::{console, tutorial};
use anyhow::{Context, Result};
use launchpad_core::LaunchpadError;
use launchpad_deploy::config::layered_lookup;
use launchpad_deploy::env::{self, GOOGLE_CLOUD_PROJECT};
use launchpad_deploy::toolchain::default_requirements;
use launchpad_deploy::{
    CommandExecutor, DeployConfig, DeployContext, DeployError, DeployOptions, DryRunExecutor,
    EnvFile, Plan, ProcessExecutor, Runbook, Stage, Step, TemplateValues, ToolRequirement,
    ToolState, check_toolchain,
};
use launchpad_model::GeminiModel;
use launchpad_runner::{Runner, SessionStatus, call_agent, ensure_session};
use launchpad_session::InMemorySessionService;
use std::path::Path;
use std::sync::Arc;

/// Exit status for a failed command.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(deploy) = error.downcast_ref::<DeployError>() {
        return deploy.exit_code();
    }
    match error.downcast_ref::<LaunchpadError>() {
        Some(LaunchpadError::Config(_)) => launchpad_deploy::error::EXIT_CONFIG,
        _ => 1,
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let env_path = cli.env_path();
    match &cli.command {
        Commands::Init(args) => init(&env_path, args),
        Commands::Doctor => doctor(&cli, &env_path).await,
        Commands::Auth { no_init, save_project: save } => {
            let mut plan = Plan::for_stages(&[Stage::Auth]);
            if *no_init {
                plan = plan.without(Step::GcloudInit);
            }
            let project = execute(&cli, &env_path, plan, DeployOptions::default()).await?;
            if *save {
                persist_project(&env_path, project.as_deref(), cli.dry_run)?;
            }
            Ok(())
        }
        Commands::Scaffold => {
            execute(&cli, &env_path, Plan::for_stages(&[Stage::Scaffold]), DeployOptions::default())
                .await
                .map(drop)
        }
        Commands::Deploy(args) => {
            execute(&cli, &env_path, Plan::for_stages(&[Stage::Deploy]), deploy_options(args))
                .await
                .map(drop)
        }
        Commands::Up { skip_auth, skip_scaffold, no_init, deploy } => {
            let mut stages = Vec::new();
            if !skip_auth {
                stages.push(Stage::Auth);
            }
            if !skip_scaffold {
                stages.push(Stage::Scaffold);
            }
            stages.push(Stage::Deploy);

            let mut plan = Plan::for_stages(&stages);
            if *no_init {
                plan = plan.without(Step::GcloudInit);
            }
            execute(&cli, &env_path, plan, deploy_options(deploy)).await.map(drop)
        }
        Commands::Chat { user_id, session_id, model, queries } => {
            chat(&env_path, model, user_id, session_id, queries).await
        }
        Commands::Console { user_id, model } => {
            let runner = tutorial_runner(&env_path, model)?;
            console::run_console(runner, user_id.clone()).await
        }
    }
}

fn deploy_options(args: &DeployArgs) -> DeployOptions {
    DeployOptions { port: args.port, with_ui: args.with_ui, trace_to_cloud: args.trace_to_cloud }
}

fn init(env_path: &Path, args: &InitArgs) -> Result<()> {
    let values = TemplateValues {
        api_key: None,
        use_vertex: args.vertex,
        project: args.project.clone(),
        location: args.location.clone(),
        agent_path: args.agent_path.clone(),
        service_name: args.service_name.clone(),
        app_name: args.app_name.clone(),
    };
    EnvFile::write_template(env_path, &values, args.force)?;

    println!("Wrote {}", env_path.display());
    if args.vertex {
        println!(
            "Fill in {GOOGLE_CLOUD_PROJECT}, SERVICE_NAME and APP_NAME, then run `launchpad up`."
        );
    } else {
        println!("Fill in GOOGLE_API_KEY, SERVICE_NAME and APP_NAME, then run `launchpad up`.");
    }
    Ok(())
}

fn tool_line(name: &str, state: &ToolState, requirement: &ToolRequirement) -> String {
    match state {
        ToolState::Installed { version } => format!("  ok       {name:<8} {version}"),
        ToolState::Missing if requirement.optional => {
            format!("  missing  {name:<8} optional; {}", requirement.install_hint)
        }
        ToolState::Missing => format!("  missing  {name:<8} install: {}", requirement.install_hint),
    }
}

async fn doctor(cli: &Cli, env_path: &Path) -> Result<()> {
    let report = check_toolchain(&ProcessExecutor, &default_requirements()).await;
    println!("Toolchain:");
    for tool in &report.tools {
        println!("{}", tool_line(tool.requirement.name, &tool.state, &tool.requirement));
    }

    println!("Configuration ({}):", env_path.display());
    let file = EnvFile::load_or_default(env_path)?;
    let config = DeployConfig::from_sources(Some(&file));
    match &config {
        Ok(config) => {
            println!("  project   {}", config.project.as_deref().unwrap_or("(from gcloud)"));
            println!("  location  {}", config.location);
            println!("  service   {}", config.service_name);
            println!("  app       {}", config.app_name);
            println!(
                "  agent     {}{}",
                config.agent_path.display(),
                if config.agent_dir(&cli.workdir).is_dir() { "" } else { " (not found)" }
            );
        }
        Err(e) => println!("  {e}"),
    }

    if !report.is_ready() {
        return Err(DeployError::MissingTools(report.missing_names()).into());
    }
    config?;
    println!("Ready to deploy.");
    Ok(())
}

/// Tools a plan shells out to.
fn requirements_for(plan: &Plan) -> Vec<ToolRequirement> {
    let needs_gcloud = [Step::GcloudInit, Step::ApplicationDefaultLogin, Step::ResolveProject]
        .into_iter()
        .any(|s| plan.contains(s));
    let needs_uv = [Step::Scaffold, Step::Sync, Step::Deploy].into_iter().any(|s| plan.contains(s));

    default_requirements()
        .into_iter()
        .filter(|r| (r.name == "gcloud" && needs_gcloud) || (r.name == "uv" && needs_uv))
        .collect()
}

/// Runs `plan` and returns the project in effect: the one gcloud reported,
/// else `GOOGLE_CLOUD_PROJECT` from the environment or `env_path`.
async fn execute(
    cli: &Cli,
    env_path: &Path,
    plan: Plan,
    options: DeployOptions,
) -> Result<Option<String>> {
    let file = EnvFile::load_or_default(env_path)?;

    let configured_project =
        layered_lookup(Some(&file), |key| std::env::var(key).ok())(GOOGLE_CLOUD_PROJECT);

    // Deploying needs a valid configuration before anything runs; other
    // stages use it when it happens to be complete.
    let config = if plan.contains(Step::Deploy) {
        Some(DeployConfig::from_sources(Some(&file))?)
    } else {
        DeployConfig::from_sources(Some(&file)).ok()
    };

    let executor: Arc<dyn CommandExecutor> = if cli.dry_run {
        Arc::new(DryRunExecutor::new())
    } else {
        let report = check_toolchain(&ProcessExecutor, &requirements_for(&plan)).await;
        if !report.is_ready() {
            return Err(DeployError::MissingTools(report.missing_names()).into());
        }
        Arc::new(ProcessExecutor)
    };

    let mut ctx = DeployContext::new(&cli.workdir)
        .with_options(options)
        .with_verify_agent_path(!cli.dry_run);
    if let Some(config) = config {
        ctx = ctx.with_config(config);
    }

    let report = Runbook::new(executor).execute(&plan, &mut ctx).await?;
    if !cli.dry_run {
        let ids: Vec<&str> = report.completed.iter().map(Step::id).collect();
        println!("Completed: {}", ids.join(", "));
    }
    Ok(ctx.project().map(str::to_string).or(configured_project))
}

fn persist_project(env_path: &Path, project: Option<&str>, dry_run: bool) -> Result<()> {
    let Some(project) = project else {
        anyhow::bail!(
            "no project to save: gcloud has no active project and {GOOGLE_CLOUD_PROJECT} is not set"
        );
    };
    if dry_run {
        println!("[dry-run] would set {GOOGLE_CLOUD_PROJECT}={project} in {}", env_path.display());
        return Ok(());
    }

    let mut file = EnvFile::load_or_default(env_path)?;
    file.set(GOOGLE_CLOUD_PROJECT, project);
    file.save(env_path)?;
    println!("Saved {GOOGLE_CLOUD_PROJECT}={project} to {}", env_path.display());
    Ok(())
}

/// Builds the tutorial runner, loading model credentials from `env_path`.
fn tutorial_runner(env_path: &Path, model_name: &str) -> Result<Runner> {
    if env_path.exists() {
        env::load_into_process(env_path)?;
    }
    let model = GeminiModel::from_env(model_name)?;
    let agent = tutorial::root_agent(Arc::new(model))?;
    let sessions = Arc::new(InMemorySessionService::default());
    Ok(Runner::new(tutorial::APP_NAME, Arc::new(agent), sessions))
}

async fn chat(
    env_path: &Path,
    model: &str,
    user_id: &str,
    session_id: &str,
    queries: &[String],
) -> Result<()> {
    let runner = tutorial_runner(env_path, model)?;
    println!("Runner created for agent '{}'.", runner.root_agent().name());

    let queries: Vec<&str> = if queries.is_empty() {
        tutorial::DEFAULT_QUERIES.to_vec()
    } else {
        queries.iter().map(String::as_str).collect()
    };

    for query in queries {
        println!("\n>>> User Query: {query}");

        let sessions = runner.session_service().as_ref();
        let status = ensure_session(sessions, runner.app_name(), user_id, session_id).await?;
        let verb = match status {
            SessionStatus::Created => "Session created",
            SessionStatus::Existing => "Using existing session",
        };
        println!("{verb}: App='{}', User='{user_id}', Session='{session_id}'", runner.app_name());

        let response = call_agent(&runner, query, user_id, session_id)
            .await
            .with_context(|| format!("query `{query}` failed"))?;
        println!("<<< Agent Response: {response}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let step = anyhow::Error::from(DeployError::StepFailed { step: "deploy", code: Some(3) });
        assert_eq!(exit_code_for(&step), 3);

        let config = anyhow::Error::from(DeployError::InvalidConfig(vec!["x".into()]));
        assert_eq!(exit_code_for(&config), 2);

        let model = anyhow::Error::from(LaunchpadError::Config("no key".into()));
        assert_eq!(exit_code_for(&model), 2);

        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), 1);
    }

    #[test]
    fn test_exit_code_survives_context() {
        let err = anyhow::Error::from(DeployError::ProjectUnresolved).context("deploy failed");
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn test_requirements_follow_plan() {
        let names = |plan: Plan| -> Vec<&'static str> {
            requirements_for(&plan).into_iter().map(|r| r.name).collect()
        };
        assert_eq!(names(Plan::for_stages(&[Stage::Auth])), vec!["gcloud"]);
        assert_eq!(names(Plan::for_stages(&[Stage::Deploy])), vec!["uv"]);
        assert_eq!(names(Plan::all()), vec!["uv", "gcloud"]);
    }
}
