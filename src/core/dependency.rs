//! The fixed dependency chain and the table of completed install locations.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// One of the four native libraries built by the pipeline, in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dependency {
    Zlib,
    Openssl,
    Libssh2,
    Libgit2,
}

impl Dependency {
    /// Build order. Each entry only depends on entries before it.
    pub const ORDER: [Dependency; 4] = [
        Dependency::Zlib,
        Dependency::Openssl,
        Dependency::Libssh2,
        Dependency::Libgit2,
    ];

    /// Package name, also the vendor directory name.
    pub const fn name(&self) -> &'static str {
        match self {
            Dependency::Zlib => "zlib",
            Dependency::Openssl => "openssl",
            Dependency::Libssh2 => "libssh2",
            Dependency::Libgit2 => "libgit2",
        }
    }

    /// Dependencies whose install trees this package compiles against.
    pub const fn upstream(&self) -> &'static [Dependency] {
        match self {
            Dependency::Zlib => &[],
            Dependency::Openssl => &[Dependency::Zlib],
            Dependency::Libssh2 => &[Dependency::Zlib, Dependency::Openssl],
            Dependency::Libgit2 => &[Dependency::Zlib, Dependency::Openssl, Dependency::Libssh2],
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Violations of the path table's grow-only contract.
#[derive(Debug, Error)]
pub enum PathTableError {
    #[error("`{requested}` install directory requested before its stage completed")]
    MissingUpstream { requested: Dependency },

    #[error("`{dependency}` is already installed at {}", .existing.display())]
    DuplicateInstall {
        dependency: Dependency,
        existing: PathBuf,
    },
}

/// Install locations for one session.
///
/// Starts with only the build base. Entries are added as stages complete and
/// are never replaced.
#[derive(Debug, Clone, Serialize)]
pub struct PathTable {
    build_base: PathBuf,
    installs: BTreeMap<Dependency, PathBuf>,
}

impl PathTable {
    pub fn new(build_base: impl Into<PathBuf>) -> Self {
        PathTable {
            build_base: build_base.into(),
            installs: BTreeMap::new(),
        }
    }

    pub fn build_base(&self) -> &Path {
        &self.build_base
    }

    /// Install directory of a completed dependency.
    pub fn get(&self, dep: Dependency) -> Result<&Path, PathTableError> {
        self.installs
            .get(&dep)
            .map(PathBuf::as_path)
            .ok_or(PathTableError::MissingUpstream { requested: dep })
    }

    /// Record a completed stage.
    pub fn insert(&mut self, dep: Dependency, install_dir: PathBuf) -> Result<(), PathTableError> {
        if let Some(existing) = self.installs.get(&dep) {
            return Err(PathTableError::DuplicateInstall {
                dependency: dep,
                existing: existing.clone(),
            });
        }
        self.installs.insert(dep, install_dir);
        Ok(())
    }

    /// Completed installs in build order.
    pub fn installs(&self) -> impl Iterator<Item = (Dependency, &Path)> {
        self.installs.iter().map(|(dep, path)| (*dep, path.as_path()))
    }
}
