//! Configuration file support for hostdeps.
//!
//! Settings come from `hostdeps.toml` in the working directory (or the file
//! named by `--config`). Command-line flags and their `HOSTDEPS_*`
//! environment variables take precedence over the file; [`Layout`] applies
//! that precedence and fills in defaults.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::TargetPlatform;

/// Project config file name.
pub const CONFIG_FILE: &str = "hostdeps.toml";

/// hostdeps configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Filesystem roots
    pub paths: PathsConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// Filesystem roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root the prebuilt toolchain paths are relative to
    pub toolchain_root: Option<PathBuf>,

    /// Scratch root; each target platform gets a subdirectory
    pub build_root: Option<PathBuf>,

    /// Directory holding the pristine `zlib`, `openssl`, `libssh2` and `libgit2` trees
    pub vendor_root: Option<PathBuf>,

    /// Where archived install trees are kept
    pub cache_dir: Option<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = auto-detect)
    pub jobs: Option<usize>,

    /// Skip self-tests
    pub no_check: bool,

    /// Reuse archived install trees
    pub cache: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            jobs: None,
            no_check: false,
            cache: true,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file doesn't exist.
    ///
    /// A file that exists but doesn't parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// Path settings given on the command line (or through their environment variables).
#[derive(Debug, Clone, Default)]
pub struct LayoutOverrides {
    pub toolchain_root: Option<PathBuf>,
    pub build_root: Option<PathBuf>,
    pub vendor_root: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

/// Fully resolved roots and build settings for one invocation.
#[derive(Debug, Clone)]
pub struct Layout {
    toolchain_root: Option<PathBuf>,
    build_root: PathBuf,
    vendor_root: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    jobs: NonZeroUsize,
    no_check: bool,
    cache: bool,
}

impl Layout {
    pub fn resolve(overrides: LayoutOverrides, config: &Config) -> Result<Self> {
        let paths = &config.paths;
        let jobs = match config.build.jobs {
            Some(n) => match NonZeroUsize::new(n) {
                Some(n) => n,
                None => bail!("`build.jobs` must be at least 1"),
            },
            None => default_jobs(),
        };

        Ok(Layout {
            toolchain_root: overrides.toolchain_root.or_else(|| paths.toolchain_root.clone()),
            build_root: overrides
                .build_root
                .or_else(|| paths.build_root.clone())
                .unwrap_or_else(default_build_root),
            vendor_root: overrides.vendor_root.or_else(|| paths.vendor_root.clone()),
            cache_dir: overrides
                .cache_dir
                .or_else(|| paths.cache_dir.clone())
                .or_else(default_cache_dir),
            jobs,
            no_check: config.build.no_check,
            cache: config.build.cache,
        })
    }

    pub fn toolchain_root(&self) -> Result<&Path> {
        match &self.toolchain_root {
            Some(p) => Ok(p),
            None => bail!(
                "toolchain root is not configured; pass --toolchain-root, set HOSTDEPS_TOOLCHAIN_ROOT or add `paths.toolchain_root` to {}",
                CONFIG_FILE
            ),
        }
    }

    pub fn vendor_root(&self) -> Result<&Path> {
        match &self.vendor_root {
            Some(p) => Ok(p),
            None => bail!(
                "vendor root is not configured; pass --vendor-root, set HOSTDEPS_VENDOR_ROOT or add `paths.vendor_root` to {}",
                CONFIG_FILE
            ),
        }
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Scratch directory for one target platform.
    pub fn build_base(&self, platform: TargetPlatform) -> PathBuf {
        self.build_root.join(platform.as_str())
    }

    /// Cache directory, unless caching is off or no directory could be determined.
    pub fn cache_dir(&self) -> Option<&Path> {
        if self.cache {
            self.cache_dir.as_deref()
        } else {
            None
        }
    }

    pub fn jobs(&self) -> NonZeroUsize {
        self.jobs
    }

    pub fn no_check(&self) -> bool {
        self.no_check
    }
}

fn default_jobs() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

fn default_build_root() -> PathBuf {
    std::env::temp_dir().join("hostdeps-build")
}

fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hostdeps").map(|dirs| dirs.cache_dir().to_path_buf())
}
