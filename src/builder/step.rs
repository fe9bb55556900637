//! Native build steps and the runner that executes them.

use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::builder::env::BuildEnv;
use crate::util::process::{find_executable, ProcessBuilder};

/// What a step does within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Regenerates the build system (e.g. `buildconf`).
    Bootstrap,
    /// Runs a configure script.
    Configure,
    Build,
    /// Runs the package's self-tests.
    Check,
    Install,
}

/// One external command issued by a recipe.
#[derive(Debug, Clone, Serialize)]
pub struct BuildStep {
    pub kind: StepKind,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Overrides layered on the inherited environment, if any.
    pub env: Option<BuildEnv>,
}

impl BuildStep {
    pub fn new(kind: StepKind, program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        BuildStep {
            kind,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, env: &BuildEnv) -> Self {
        self.env = Some(env.clone());
        self
    }

    /// Program and arguments as a single line.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn to_process(&self) -> ProcessBuilder {
        let mut pb = ProcessBuilder::new(&self.program)
            .args(&self.args)
            .cwd(&self.cwd);
        if let Some(ref env) = self.env {
            for (key, value) in env.iter() {
                pb = pb.env(key, value);
            }
        }
        pb
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.env {
            Some(ref env) if !env.is_empty() => write!(f, "{} {}", env, self.command_line()),
            _ => f.write_str(&self.command_line()),
        }
    }
}

/// Executes build steps. A non-zero exit is an error.
pub trait CommandRunner {
    /// Check that the host can run native builds at all.
    fn preflight(&mut self) -> Result<()> {
        Ok(())
    }

    fn run(&mut self, step: &BuildStep) -> Result<()>;
}

/// Runs steps as child processes.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    /// Stream tool output to the terminal instead of capturing it.
    pub inherit_output: bool,
}

impl ProcessRunner {
    pub fn new(inherit_output: bool) -> Self {
        ProcessRunner { inherit_output }
    }
}

impl CommandRunner for ProcessRunner {
    fn preflight(&mut self) -> Result<()> {
        if find_executable("make").is_none() {
            bail!(
                "`make` not found\n\
                 \n\
                 Native dependencies are built with their own makefiles.\n\
                 Install GNU make and ensure it's in your PATH."
            );
        }
        Ok(())
    }

    fn run(&mut self, step: &BuildStep) -> Result<()> {
        tracing::trace!("running: {}", step);
        let pb = step.to_process();
        if self.inherit_output {
            pb.status_and_check()
        } else {
            pb.exec_and_check().map(|_| ())
        }
    }
}
