//! Native build recipes, one per dependency.
//!
//! A recipe receives a [`Stage`] holding everything resolved for it: the
//! toolchain, the staged working copy, its install directory and the install
//! directories of the stages before it. Recipes issue commands through the
//! stage and never look at raw OS or CPU strings.

mod libgit2;
mod libssh2;
mod openssl;
mod zlib;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::step::{BuildStep, CommandRunner, StepKind};
use crate::builder::toolchain::ToolchainDescriptor;
use crate::core::{BuildOptions, Dependency, PathTable};

pub use zlib::patch_mingw_makefile;

/// Context for one dependency's build.
pub struct Stage<'a> {
    pub dep: Dependency,
    pub options: &'a BuildOptions,
    pub toolchain: &'a ToolchainDescriptor,
    pub work_dir: PathBuf,
    pub install_dir: PathBuf,
    paths: &'a PathTable,
    runner: &'a mut dyn CommandRunner,
}

impl<'a> Stage<'a> {
    pub fn new(
        dep: Dependency,
        options: &'a BuildOptions,
        toolchain: &'a ToolchainDescriptor,
        paths: &'a PathTable,
        work_dir: PathBuf,
        install_dir: PathBuf,
        runner: &'a mut dyn CommandRunner,
    ) -> Self {
        Stage {
            dep,
            options,
            toolchain,
            work_dir,
            install_dir,
            paths,
            runner,
        }
    }

    /// Install directory of a dependency this stage builds against.
    pub fn upstream(&self, dep: Dependency) -> Result<&Path> {
        if !self.dep.upstream().contains(&dep) {
            bail!("`{}` does not build against `{}`", self.dep, dep);
        }
        Ok(self.paths.get(dep)?)
    }

    /// A step running `program` in the working copy.
    pub fn step(&self, kind: StepKind, program: impl Into<PathBuf>) -> BuildStep {
        BuildStep::new(kind, program, &self.work_dir)
    }

    /// A step running a script shipped in the working copy.
    pub fn script(&self, kind: StepKind, name: &str) -> BuildStep {
        self.step(kind, self.work_dir.join(name))
    }

    pub fn make(&self, kind: StepKind) -> BuildStep {
        self.step(kind, "make")
    }

    /// `make -j <jobs>`.
    pub fn make_parallel(&self, kind: StepKind) -> BuildStep {
        self.make(kind).args(["-j".to_string(), self.options.num_jobs().to_string()])
    }

    pub fn run(&mut self, step: BuildStep) -> Result<()> {
        tracing::debug!("{} {}: {}", self.dep, kind_label(step.kind), step.command_line());
        self.runner.run(&step)
    }

    /// Run a self-test step unless checks are disabled.
    pub fn check(&mut self, step: BuildStep) -> Result<()> {
        if self.options.no_check() {
            tracing::debug!("{}: skipping self-tests", self.dep);
            return Ok(());
        }
        self.run(step)
    }
}

fn kind_label(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Bootstrap => "bootstrap",
        StepKind::Configure => "configure",
        StepKind::Build => "build",
        StepKind::Check => "check",
        StepKind::Install => "install",
    }
}

/// Run the recipe for the stage's dependency.
pub fn build(stage: &mut Stage<'_>) -> Result<()> {
    match stage.dep {
        Dependency::Zlib => zlib::build(stage),
        Dependency::Openssl => openssl::build(stage),
        Dependency::Libssh2 => libssh2::build(stage),
        Dependency::Libgit2 => libgit2::build(stage),
    }
}
