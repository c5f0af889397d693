//! Process invocations described as data so they can be inspected in tests
//! before anything is spawned.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};

use tokio::process::Command;
use tracing::trace;

use crate::error::SetupError;

/// Abstract command representation so we can test without spawning processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub inherit_stdio: bool,
}

impl Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(cwd) = &self.cwd {
            write!(f, "(in {}) ", cwd.display())?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a non-interactive run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 when the process was killed by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            inherit_stdio: false,
        }
    }

    /// Build from `[program, leading args...]`; `None` when empty.
    pub fn from_template(template: &[String]) -> Option<Self> {
        let (program, args) = template.split_first()?;
        let mut spec = Self::new(program.clone());
        spec.args = args.to_vec();
        Some(spec)
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

    /// Arguments joined for error messages.
    pub fn args_display(&self) -> String {
        self.args.join(" ")
    }

    fn spawn_error(&self, source: std::io::Error) -> SetupError {
        SetupError::ToolSpawn {
            program: self.program.clone(),
            source,
        }
    }
}

pub fn to_command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    if !spec.env.is_empty() {
        cmd.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    if spec.inherit_stdio {
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
    }
    cmd
}

pub async fn run_spec(spec: &CommandSpec) -> Result<ExitStatus, SetupError> {
    trace!("running {spec}");
    to_command(spec)
        .status()
        .await
        .map_err(|e| spec.spawn_error(e))
}

pub async fn run_spec_inherit(
    spec: &CommandSpec,
) -> Result<ExitStatus, SetupError> {
    let mut spec = spec.clone();
    spec.inherit_stdio = true;
    run_spec(&spec).await
}

pub async fn run_spec_with_output(
    spec: &CommandSpec,
) -> Result<CommandOutput, SetupError> {
    trace!("running {spec} (captured)");
    let output = to_command(spec)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spec.spawn_error(e))?;
    Ok(CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// `docker compose pull` in the compose root.
pub fn compose_pull_spec(compose_root: &Path) -> CommandSpec {
    CommandSpec::new("docker")
        .args(["compose", "pull"])
        .current_dir(compose_root)
}

/// `docker compose up -d --build` in the compose root.
pub fn compose_up_spec(compose_root: &Path) -> CommandSpec {
    CommandSpec::new("docker")
        .args(["compose", "up", "-d", "--build"])
        .current_dir(compose_root)
}
