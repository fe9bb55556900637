//! Build pipeline errors.
//!
//! Command failures surface as [`crate::util::process::ExternalCommandFailure`]
//! and path table misuse as [`crate::core::PathTableError`]; this enum covers
//! what the pipeline itself checks.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::Dependency;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("vendor sources for `{dependency}` not found at {}", .path.display())]
    MissingVendorSource {
        dependency: Dependency,
        path: PathBuf,
    },

    #[error("`{dependency}` build did not produce {}", .path.display())]
    MissingArtifact {
        dependency: Dependency,
        path: PathBuf,
    },
}
