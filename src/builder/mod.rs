//! Native build of the host dependency chain.
//!
//! [`toolchain`] maps a target to its prebuilt compiler, [`sources`] stages
//! vendor trees, [`recipes`] drive each package's own build system and
//! [`pipeline`] runs them in order.

pub mod cache;
pub mod env;
pub mod errors;
pub mod pipeline;
pub mod recipes;
pub mod sources;
pub mod step;
pub mod toolchain;

pub use cache::{ArtifactCache, TarballCache};
pub use env::{BuildEnv, EnvKey};
pub use errors::BuildError;
pub use pipeline::{LogReporter, Pipeline, PipelineOutcome, ProgressReporter};
pub use sources::SourcePreparer;
pub use step::{BuildStep, CommandRunner, ProcessRunner, StepKind};
pub use toolchain::{PlatformResolver, ToolchainDescriptor};
