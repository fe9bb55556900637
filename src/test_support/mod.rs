//! Test utilities for hostdeps unit tests.
//!
//! [`RecordingRunner`] stands in for the process runner: it records every
//! step and fakes what `make install` leaves behind, so whole sessions can
//! run without a toolchain. [`VendorFixture`] writes minimal vendor trees.

pub mod fixtures;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::sources::WORKDIR_SUFFIX;
use crate::builder::step::{BuildStep, CommandRunner, StepKind};
use crate::util::fs::list_files;

pub use fixtures::VendorFixture;

type StepPredicate = Box<dyn Fn(&BuildStep) -> bool>;

/// Fake [`CommandRunner`] that records steps instead of running them.
#[derive(Default)]
pub struct RecordingRunner {
    steps: Vec<BuildStep>,
    preflight_calls: usize,
    fail_when: Option<StepPredicate>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    /// Fail every step matching `predicate` (after recording it).
    pub fn fail_when(mut self, predicate: impl Fn(&BuildStep) -> bool + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    pub fn preflight_calls(&self) -> usize {
        self.preflight_calls
    }

    /// Lay out what an autotools `make install` would produce.
    fn fake_install(step: &BuildStep) -> Result<()> {
        let work = step.cwd.to_string_lossy();
        let Some(install) = work.strip_suffix(WORKDIR_SUFFIX) else {
            bail!("step outside a working copy: {}", step.cwd.display());
        };
        let install = PathBuf::from(install);
        for dir in ["lib/pkgconfig", "include", "share/man"] {
            std::fs::create_dir_all(install.join(dir))?;
        }
        std::fs::write(install.join("lib/installed"), step.command_line())?;
        Ok(())
    }
}

impl CommandRunner for RecordingRunner {
    fn preflight(&mut self) -> Result<()> {
        self.preflight_calls += 1;
        Ok(())
    }

    fn run(&mut self, step: &BuildStep) -> Result<()> {
        self.steps.push(step.clone());
        if let Some(fail) = &self.fail_when {
            if fail(step) {
                bail!("simulated failure: {}", step.command_line());
            }
        }
        if step.kind == StepKind::Install {
            Self::fake_install(step)?;
        }
        Ok(())
    }
}

/// Relative path to contents of every file under `root`.
pub fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    list_files(root)
        .unwrap_or_default()
        .into_iter()
        .map(|rel| {
            let contents = std::fs::read(root.join(&rel)).unwrap_or_default();
            (rel, contents)
        })
        .collect()
}
