//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use hostdeps::util::LayoutOverrides;

/// hostdeps - builds zlib, OpenSSL, libssh2 and libgit2 for a host platform
#[derive(Parser)]
#[command(name = "hostdeps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (defaults to ./hostdeps.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the whole dependency chain for a target
    Build(BuildArgs),

    /// Show the toolchain resolved for a target
    Toolchain(ToolchainArgs),

    /// Remove build directories
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct TargetArgs {
    /// Target OS (linux, darwin, windows)
    #[arg(long)]
    pub os: String,

    /// Target CPU (x86, x86_64)
    #[arg(long)]
    pub cpu: String,
}

#[derive(Args)]
pub struct PathArgs {
    /// Root of the prebuilt toolchains
    #[arg(long, env = "HOSTDEPS_TOOLCHAIN_ROOT", value_name = "DIR")]
    pub toolchain_root: Option<PathBuf>,

    /// Scratch directory; each target gets a subdirectory
    #[arg(long, env = "HOSTDEPS_BUILD_ROOT", value_name = "DIR")]
    pub build_root: Option<PathBuf>,

    /// Directory holding the vendored package sources
    #[arg(long, env = "HOSTDEPS_VENDOR_ROOT", value_name = "DIR")]
    pub vendor_root: Option<PathBuf>,

    /// Artifact cache directory
    #[arg(long, env = "HOSTDEPS_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

impl PathArgs {
    pub fn overrides(&self) -> LayoutOverrides {
        LayoutOverrides {
            toolchain_root: self.toolchain_root.clone(),
            build_root: self.build_root.clone(),
            vendor_root: self.vendor_root.clone(),
            cache_dir: self.cache_dir.clone(),
        }
    }
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub paths: PathArgs,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Skip the packages' self-tests
    #[arg(long)]
    pub no_check: bool,

    /// Always build, ignoring the artifact cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub paths: PathArgs,

    /// Print the descriptor as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Target OS (linux, darwin, windows)
    #[arg(long, required_unless_present = "all")]
    pub os: Option<String>,

    /// Target CPU (x86, x86_64)
    #[arg(long, required_unless_present = "all")]
    pub cpu: Option<String>,

    #[command(flatten)]
    pub paths: PathArgs,

    /// Remove the build root for every target
    #[arg(long)]
    pub all: bool,
}
