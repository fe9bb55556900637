//! Staging vendor sources into disposable working copies.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::errors::BuildError;
use crate::core::Dependency;
use crate::util::fs::{copy_dir_all, ensure_dir, remove_all_if_exists};

/// Suffix separating a working copy from the pristine package name.
pub const WORKDIR_SUFFIX: &str = ".build";

/// Working copy location for `dep` under `build_base`.
pub fn work_dir(build_base: &Path, dep: Dependency) -> PathBuf {
    build_base.join(format!("{}{}", dep.name(), WORKDIR_SUFFIX))
}

/// Copies pristine vendor trees into a build base.
///
/// Every call starts by removing whatever a previous (possibly interrupted)
/// run left behind, so preparing twice gives the same tree.
#[derive(Debug, Clone)]
pub struct SourcePreparer {
    vendor_root: PathBuf,
    prepared: Vec<Dependency>,
}

impl SourcePreparer {
    pub fn new(vendor_root: impl Into<PathBuf>) -> Self {
        SourcePreparer {
            vendor_root: vendor_root.into(),
            prepared: Vec::new(),
        }
    }

    /// Pristine source directory for `dep`.
    pub fn vendor_dir(&self, dep: Dependency) -> PathBuf {
        self.vendor_root.join(dep.name())
    }

    /// Fail unless the vendor tree for `dep` exists.
    pub fn check_vendor(&self, dep: Dependency) -> Result<(), BuildError> {
        let path = self.vendor_dir(dep);
        if path.is_dir() {
            Ok(())
        } else {
            Err(BuildError::MissingVendorSource {
                dependency: dep,
                path,
            })
        }
    }

    /// Stage `dep` into `<build_base>/<name>.build` and return that directory.
    pub fn prepare(&mut self, dep: Dependency, build_base: &Path) -> Result<PathBuf> {
        self.check_vendor(dep)?;
        ensure_dir(build_base)?;

        let copy = build_base.join(dep.name());
        let work = work_dir(build_base, dep);
        tracing::debug!("staging {} into {}", dep, work.display());

        remove_all_if_exists(&copy)?;
        copy_dir_all(&self.vendor_dir(dep), &copy)?;
        remove_all_if_exists(&work)?;
        fs::rename(&copy, &work).with_context(|| {
            format!("failed to rename {} to {}", copy.display(), work.display())
        })?;

        self.prepared.push(dep);
        Ok(work)
    }

    /// Packages staged so far, in order.
    pub fn prepared(&self) -> &[Dependency] {
        &self.prepared
    }

    pub fn into_prepared(self) -> Vec<Dependency> {
        self.prepared
    }
}
