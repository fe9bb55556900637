//! Per-session build options.

use std::num::NonZeroUsize;

use serde::Serialize;

use super::platform::{PlatformError, TargetCpu, TargetOs, TargetPlatform};

/// Options for one build session. Constructed once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
    target_os: TargetOs,
    target_cpu: TargetCpu,
    target_platform: TargetPlatform,
    num_jobs: NonZeroUsize,
    no_check: bool,
}

impl BuildOptions {
    /// Create options for a target, using the host's parallelism for `make -j`.
    pub fn new(target_os: TargetOs, target_cpu: TargetCpu) -> Self {
        BuildOptions {
            target_os,
            target_cpu,
            target_platform: TargetPlatform::new(target_os, target_cpu),
            num_jobs: default_jobs(),
            no_check: false,
        }
    }

    /// Create options from raw OS and CPU names.
    pub fn parse(os: &str, cpu: &str) -> Result<Self, PlatformError> {
        let target_os = TargetOs::parse(os, "build options: target os")?;
        let target_cpu = TargetCpu::parse(cpu, "build options: target cpu")?;
        Ok(BuildOptions::new(target_os, target_cpu))
    }

    /// Set the parallelism hint passed to the native build tool.
    pub fn with_jobs(mut self, jobs: NonZeroUsize) -> Self {
        self.num_jobs = jobs;
        self
    }

    /// Skip the packages' self-tests.
    pub fn with_no_check(mut self, no_check: bool) -> Self {
        self.no_check = no_check;
        self
    }

    pub fn target_os(&self) -> TargetOs {
        self.target_os
    }

    pub fn target_cpu(&self) -> TargetCpu {
        self.target_cpu
    }

    pub fn target_platform(&self) -> TargetPlatform {
        self.target_platform
    }

    pub fn num_jobs(&self) -> usize {
        self.num_jobs.get()
    }

    pub fn no_check(&self) -> bool {
        self.no_check
    }
}

fn default_jobs() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
