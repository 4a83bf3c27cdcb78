use crate::command::CommandExecutor;
use crate::error::{DeployError, Result};
use crate::steps::{DeployContext, Plan, Step};
use std::sync::Arc;

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub completed: Vec<Step>,
    pub resolved_project: Option<String>,
}

/// Executes a [`Plan`] one step at a time, stopping at the first failure.
pub struct Runbook {
    executor: Arc<dyn CommandExecutor>,
}

/// Extracts the project id from `gcloud config get-value project` output.
pub fn parse_project(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .filter(|l| *l != "(unset)")
        .map(str::to_string)
}

impl Runbook {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    pub async fn execute(&self, plan: &Plan, ctx: &mut DeployContext) -> Result<RunReport> {
        Self::preflight(plan, ctx)?;

        let total = plan.steps().len();
        let mut report = RunReport::default();

        for (index, step) in plan.steps().iter().enumerate() {
            if *step == Step::Deploy && ctx.verify_agent_path {
                if let Some(config) = &ctx.config {
                    config.check_agent_dir(&ctx.workdir)?;
                }
            }

            let spec = step.command(ctx)?;
            tracing::info!(
                step = step.id(),
                position = index + 1,
                total,
                command = %spec,
                "{}",
                step.description()
            );

            let output = self.executor.run(&spec).await?;
            if !output.success() {
                tracing::error!(step = step.id(), code = ?output.code, "step failed");
                return Err(DeployError::StepFailed { step: step.id(), code: output.code });
            }

            if *step == Step::ResolveProject {
                self.record_project(plan, ctx, &output.stdout)?;
            }
            report.completed.push(*step);
        }

        report.resolved_project = ctx.resolved_project.clone();
        tracing::info!(steps = report.completed.len(), "runbook finished");
        Ok(report)
    }

    /// Checks that can fail before anything external runs.
    fn preflight(plan: &Plan, ctx: &DeployContext) -> Result<()> {
        if !plan.contains(Step::Deploy) {
            return Ok(());
        }
        if ctx.config.is_none() {
            return Err(DeployError::InvalidConfig(vec![
                "deploy configuration was not loaded".to_string(),
            ]));
        }
        if !plan.contains(Step::ResolveProject) && ctx.project().is_none() {
            return Err(DeployError::ProjectUnresolved);
        }
        Ok(())
    }

    fn record_project(&self, plan: &Plan, ctx: &mut DeployContext, stdout: &str) -> Result<()> {
        match parse_project(stdout) {
            Some(project) => {
                tracing::info!(%project, "using gcloud project");
                ctx.resolved_project = Some(project);
            }
            None => {
                tracing::warn!("gcloud has no default project; keeping the configured one");
                if plan.contains(Step::Deploy) && ctx.project().is_none() {
                    return Err(DeployError::ProjectUnresolved);
                }
            }
        }
        Ok(())
    }
}
