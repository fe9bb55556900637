//! hostdeps - builds the native libgit2 dependency chain for host tools
//!
//! For one target OS/CPU pair this crate stages vendored zlib, OpenSSL,
//! libssh2 and libgit2 sources and builds them, in that order, with the
//! matching prebuilt toolchain. Each package links against the install
//! trees of the ones before it.

pub mod builder;
pub mod core;
pub mod util;

/// Test utilities and fakes for hostdeps unit tests.
#[cfg(test)]
pub mod test_support;

pub use builder::{Pipeline, PipelineOutcome, PlatformResolver, ToolchainDescriptor};
pub use core::{BuildOptions, Dependency, PathTable, TargetCpu, TargetOs, TargetPlatform};
