use crate::error::{DeployError, Result};
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Capture stdout instead of passing it through to the terminal.
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: None, capture: false }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

fn shell_quote(word: &str) -> Cow<'_, str> {
    let plain = !word.is_empty()
        && word.chars().all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout; empty unless the spec asked for capture.
    pub stdout: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { code: Some(0), stdout: stdout.into() }
    }

    pub fn failed(code: i32) -> Self {
        Self { code: Some(code), stdout: String::new() }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `spec` to completion. A non-zero exit is a normal [`CommandOutput`];
    /// only a failure to launch is an error.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as child processes sharing this process's terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::inherit()).stderr(Stdio::inherit());
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        let spawn_error =
            |source: std::io::Error| DeployError::Spawn { program: spec.program.clone(), source };

        if spec.capture {
            let output = cmd.stdout(Stdio::piped()).output().await.map_err(spawn_error)?;
            Ok(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        } else {
            let status = cmd.stdout(Stdio::inherit()).status().await.map_err(spawn_error)?;
            Ok(CommandOutput { code: status.code(), stdout: String::new() })
        }
    }
}

/// Prints commands instead of running them. Every command "succeeds" with
/// empty output.
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    recorded: Mutex<Vec<CommandSpec>>,
    quiet: bool,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records without printing.
    pub fn quiet() -> Self {
        Self { recorded: Mutex::new(Vec::new()), quiet: true }
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.recorded.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CommandExecutor for DryRunExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if !self.quiet {
            match &spec.cwd {
                Some(cwd) => println!("[dry-run] (cd {} && {spec})", cwd.display()),
                None => println!("[dry-run] {spec}"),
            }
        }
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(spec.clone());
        }
        Ok(CommandOutput::ok(""))
    }
}
