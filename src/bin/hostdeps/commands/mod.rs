//! Command implementations

pub mod build;
pub mod clean;
pub mod toolchain;

use std::path::Path;

use anyhow::Result;

use crate::cli::PathArgs;
use hostdeps::util::config::{Config, Layout, CONFIG_FILE};

/// Resolve roots from flags, environment and the config file.
///
/// An explicit `--config` must exist; the default `hostdeps.toml` is optional.
pub fn load_layout(config: Option<&Path>, paths: &PathArgs) -> Result<Layout> {
    let config = match config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(Path::new(CONFIG_FILE))?,
    };
    Layout::resolve(paths.overrides(), &config)
}
