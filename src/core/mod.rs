//! Core data model: targets, session options and the dependency chain.

pub mod dependency;
pub mod options;
pub mod platform;

pub use dependency::{Dependency, PathTable, PathTableError};
pub use options::BuildOptions;
pub use platform::{PlatformError, TargetCpu, TargetOs, TargetPlatform};
