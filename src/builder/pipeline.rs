//! The fixed four-stage build: zlib, OpenSSL, libssh2, libgit2.
//!
//! Each stage is staged from the vendor tree, built by its recipe and
//! recorded in the [`PathTable`] before the next one starts. The first
//! failure ends the session; nothing after it is prepared or run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::cache::{archive_name, cache_key, ArtifactCache};
use crate::builder::errors::BuildError;
use crate::builder::recipes::{self, Stage};
use crate::builder::sources::SourcePreparer;
use crate::builder::step::CommandRunner;
use crate::builder::toolchain::{PlatformResolver, ToolchainDescriptor};
use crate::core::{BuildOptions, Dependency, PathTable};
use crate::util::fs::remove_all_if_exists;

/// Observer for stage transitions.
///
/// The defaults log through `tracing`; the CLI shell overrides them to
/// drive its progress output.
pub trait ProgressReporter {
    /// Free-form status text.
    fn log(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn stage_started(&self, dep: Dependency) {
        tracing::info!("building {}", dep);
    }

    fn stage_finished(&self, dep: Dependency, install_dir: &Path) {
        tracing::info!("built {} into {}", dep, install_dir.display());
    }

    fn stage_restored(&self, dep: Dependency, install_dir: &Path) {
        tracing::info!("restored {} from cache into {}", dep, install_dir.display());
    }
}

/// Reporter that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {}

static LOG_REPORTER: LogReporter = LogReporter;

/// What a finished session produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Install directory of every package.
    pub paths: PathTable,
    /// Packages staged from vendor sources, in order.
    pub prepared: Vec<Dependency>,
    /// Packages taken from the artifact cache instead of being built.
    pub restored: Vec<Dependency>,
}

#[derive(Debug)]
struct PlannedStage {
    dep: Dependency,
    archive: Option<String>,
    cached: bool,
}

/// One build session for a single target platform.
pub struct Pipeline<'a> {
    resolver: &'a PlatformResolver,
    options: &'a BuildOptions,
    preparer: SourcePreparer,
    build_base: PathBuf,
    runner: &'a mut dyn CommandRunner,
    cache: Option<&'a dyn ArtifactCache>,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        resolver: &'a PlatformResolver,
        options: &'a BuildOptions,
        preparer: SourcePreparer,
        build_base: impl Into<PathBuf>,
        runner: &'a mut dyn CommandRunner,
    ) -> Self {
        Pipeline {
            resolver,
            options,
            preparer,
            build_base: build_base.into(),
            runner,
            cache: None,
            reporter: &LOG_REPORTER,
        }
    }

    pub fn with_cache(mut self, cache: &'a dyn ArtifactCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Build every package in order.
    pub fn run(mut self) -> Result<PipelineOutcome> {
        let toolchain = self.resolver.descriptor(self.options)?;
        tracing::debug!(
            "toolchain for {}: cc={} cflags={:?}",
            toolchain.platform,
            toolchain.cc.display(),
            toolchain.cflags
        );

        let plan = self.plan(&toolchain)?;
        if self.cache.is_some() {
            let hits = plan.iter().filter(|s| s.cached).count();
            self.reporter
                .log(&format!("{} of {} packages cached", hits, plan.len()));
        }

        // Validate everything a build needs before touching the build base.
        let mut needs_build = false;
        for stage in plan.iter().filter(|s| !s.cached) {
            self.preparer.check_vendor(stage.dep)?;
            needs_build = true;
        }
        if needs_build {
            self.runner.preflight()?;
        }

        let mut paths = PathTable::new(&self.build_base);
        let mut restored = Vec::new();

        for planned in &plan {
            let dep = planned.dep;
            let install_dir = self.build_base.join(dep.name());

            match (self.cache, planned.archive.as_deref()) {
                (Some(cache), Some(archive)) if planned.cached => {
                    remove_all_if_exists(&install_dir)?;
                    cache.unpack(archive, &install_dir)?;
                    self.reporter.stage_restored(dep, &install_dir);
                    restored.push(dep);
                }
                _ => {
                    self.reporter.stage_started(dep);

                    let work_dir = self.preparer.prepare(dep, &self.build_base)?;
                    let mut stage = Stage::new(
                        dep,
                        self.options,
                        &toolchain,
                        &paths,
                        work_dir,
                        install_dir.clone(),
                        &mut *self.runner,
                    );
                    recipes::build(&mut stage).with_context(|| format!("failed to build `{}`", dep))?;

                    let lib_dir = install_dir.join("lib");
                    if !lib_dir.is_dir() {
                        return Err(BuildError::MissingArtifact {
                            dependency: dep,
                            path: lib_dir,
                        }
                        .into());
                    }

                    if let (Some(cache), Some(archive)) = (self.cache, planned.archive.as_deref()) {
                        cache
                            .store(archive, &install_dir)
                            .with_context(|| format!("failed to cache `{}`", dep))?;
                    }
                    self.reporter.stage_finished(dep, &install_dir);
                }
            }

            paths.insert(dep, install_dir)?;
        }

        Ok(PipelineOutcome {
            paths,
            prepared: self.preparer.into_prepared(),
            restored,
        })
    }

    fn plan(&self, toolchain: &ToolchainDescriptor) -> Result<Vec<PlannedStage>> {
        let platform = self.options.target_platform();
        let mut keys = BTreeMap::new();
        let mut plan = Vec::with_capacity(Dependency::ORDER.len());

        for dep in Dependency::ORDER {
            let (archive, cached) = match self.cache {
                Some(cache) => {
                    let key = cache_key(dep, toolchain, &keys)?;
                    let archive = archive_name(dep, platform, &key);
                    let cached = cache.contains(&archive);
                    keys.insert(dep, key);
                    (Some(archive), cached)
                }
                None => (None, false),
            };
            tracing::debug!("{}: {}", dep, if cached { "cached" } else { "to build" });
            plan.push(PlannedStage { dep, archive, cached });
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::cache::TarballCache;
    use crate::builder::env::EnvKey;
    use crate::builder::step::{BuildStep, StepKind};
    use crate::core::{TargetCpu, TargetOs};
    use crate::test_support::{RecordingRunner, VendorFixture};
    use std::num::NonZeroUsize;
    use tempfile::TempDir;

    struct Session {
        tmp: TempDir,
        vendor: VendorFixture,
        resolver: PlatformResolver,
    }

    impl Session {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let vendor = VendorFixture::create(tmp.path()).unwrap();
            let resolver = PlatformResolver::new(tmp.path().join("ndk")).with_host_path("/usr/bin");
            Session {
                tmp,
                vendor,
                resolver,
            }
        }

        fn base(&self) -> PathBuf {
            self.tmp.path().join("build")
        }

        fn run(&self, options: &BuildOptions, runner: &mut RecordingRunner) -> Result<PipelineOutcome> {
            Pipeline::new(
                &self.resolver,
                options,
                SourcePreparer::new(self.vendor.root()),
                self.base(),
                runner,
            )
            .run()
        }
    }

    fn steps_of(steps: &[BuildStep], base: &Path, dep: Dependency) -> Vec<BuildStep> {
        let work = base.join(format!("{}.build", dep.name()));
        steps.iter().filter(|s| s.cwd == work).cloned().collect()
    }

    #[test]
    fn test_linux_session_builds_in_order() {
        let session = Session::new();
        let options = BuildOptions::new(TargetOs::Linux, TargetCpu::X86_64)
            .with_jobs(NonZeroUsize::new(4).unwrap());
        let mut runner = RecordingRunner::new();

        let outcome = session.run(&options, &mut runner).unwrap();
        let base = session.base();

        assert_eq!(outcome.prepared, Dependency::ORDER.to_vec());
        assert!(outcome.restored.is_empty());
        assert_eq!(runner.preflight_calls(), 1);
        for dep in Dependency::ORDER {
            assert_eq!(outcome.paths.get(dep).unwrap(), base.join(dep.name()));
        }

        // Stages never interleave.
        let mut seen: Vec<PathBuf> = runner.steps().iter().map(|s| s.cwd.clone()).collect();
        seen.dedup();
        let expected: Vec<PathBuf> = Dependency::ORDER
            .iter()
            .map(|d| base.join(format!("{}.build", d.name())))
            .collect();
        assert_eq!(seen, expected);

        let zlib = steps_of(runner.steps(), &base, Dependency::Zlib);
        assert_eq!(zlib[0].kind, StepKind::Configure);
        assert_eq!(
            zlib[0].args,
            vec![format!("--prefix={}", base.join("zlib").display()), "--static".to_string()]
        );
        assert_eq!(zlib[1].args, vec!["-j", "4"]);
        assert!(!base.join("zlib/share").exists());
        assert!(!base.join("zlib/lib/pkgconfig").exists());

        let libgit2 = base.join("libgit2");
        assert!(libgit2.join("lib/libgit2.a").is_file());
        assert!(libgit2.join("include/git2.h").is_file());
        assert!(libgit2.join("include/git2/common.h").is_file());
    }

    #[test]
    fn test_stage_never_references_later_packages() {
        let session = Session::new();
        let options = BuildOptions::new(TargetOs::Linux, TargetCpu::X86);
        let mut runner = RecordingRunner::new();
        session.run(&options, &mut runner).unwrap();
        let base = session.base();

        for (i, dep) in Dependency::ORDER.iter().enumerate() {
            let later: Vec<String> = Dependency::ORDER[i + 1..]
                .iter()
                .map(|d| base.join(d.name()).display().to_string())
                .collect();
            for step in steps_of(runner.steps(), &base, *dep) {
                let mut text = step.command_line();
                if let Some(env) = &step.env {
                    text.push(' ');
                    text.push_str(&env.to_string());
                }
                for path in &later {
                    assert!(!text.contains(path.as_str()), "{} step mentions {}: {}", dep, path, text);
                }
            }
        }
    }

    #[test]
    fn test_upstream_installs_reach_later_stages() {
        let session = Session::new();
        let options = BuildOptions::new(TargetOs::Linux, TargetCpu::X86_64);
        let mut runner = RecordingRunner::new();
        session.run(&options, &mut runner).unwrap();
        let base = session.base();
        let zlib = base.join("zlib").display().to_string();
        let openssl = base.join("openssl").display().to_string();
        let libssh2 = base.join("libssh2").display().to_string();

        let configure = &steps_of(runner.steps(), &base, Dependency::Openssl)[0];
        assert_eq!(configure.kind, StepKind::Configure);
        for arg in [
            "linux-x86_64".to_string(),
            format!("-I{}/include", zlib),
            format!("-L{}/lib", zlib),
            "-lz".to_string(),
        ] {
            assert!(configure.args.contains(&arg), "openssl Configure lacks {}", arg);
        }

        let configure = &steps_of(runner.steps(), &base, Dependency::Libssh2)[1];
        assert!(configure.args.contains(&format!("--with-libssl-prefix={}", openssl)));
        assert!(configure.args.contains(&format!("--with-libz={}", zlib)));
        let env = configure.env.as_ref().unwrap();
        let cflags = env.get(EnvKey::Cflags).unwrap();
        assert!(cflags.contains(&format!("-I{}/include", openssl)), "{}", cflags);
        assert!(cflags.contains(&format!("-I{}/include", zlib)), "{}", cflags);
        let ldflags = env.get(EnvKey::Ldflags).unwrap();
        assert!(ldflags.contains(&format!("-L{}/lib", openssl)), "{}", ldflags);
        assert!(ldflags.contains(&format!("-L{}/lib", zlib)), "{}", ldflags);

        let make = &steps_of(runner.steps(), &base, Dependency::Libgit2)[0];
        let env = make.env.as_ref().unwrap();
        assert_eq!(
            env.get(EnvKey::ExtraIncludes),
            Some(format!("-I{}/include -I{}/include -I{}/include", zlib, openssl, libssh2).as_str())
        );
        assert_eq!(env.get(EnvKey::ExtraDefines), Some("-DGIT_SSL -DOPENSSL_SHA1 -DGIT_SSH"));
    }

    #[test]
    fn test_zlib_configures_on_unix_targets() {
        for os in [TargetOs::Linux, TargetOs::Darwin] {
            let session = Session::new();
            let options = BuildOptions::new(os, TargetCpu::X86);
            let mut runner = RecordingRunner::new();
            session.run(&options, &mut runner).unwrap();
            let base = session.base();

            let zlib = steps_of(runner.steps(), &base, Dependency::Zlib);
            assert_eq!(zlib[0].kind, StepKind::Configure, "{}", os);
            assert!(zlib[0].args.contains(&"--static".to_string()), "{}", os);
        }
    }

    #[test]
    fn test_libssh2_system_libs_per_os() {
        for (os, libs) in [
            (TargetOs::Linux, Some("-ldl")),
            (TargetOs::Darwin, None),
            (TargetOs::Windows, Some("-lgdi32")),
        ] {
            let session = Session::new();
            let options = BuildOptions::new(os, TargetCpu::X86_64);
            let mut runner = RecordingRunner::new();
            session.run(&options, &mut runner).unwrap();

            let steps = steps_of(runner.steps(), &session.base(), Dependency::Libssh2);
            let env = steps[1].env.as_ref().unwrap();
            assert_eq!(env.get(EnvKey::Libs), libs, "{}", os);
        }
    }

    #[test]
    fn test_libssh2_environment() {
        let session = Session::new();
        let options = BuildOptions::new(TargetOs::Windows, TargetCpu::X86_64);
        let mut runner = RecordingRunner::new();
        session.run(&options, &mut runner).unwrap();
        let base = session.base();

        let steps = steps_of(runner.steps(), &base, Dependency::Libssh2);
        assert_eq!(steps[0].kind, StepKind::Bootstrap);
        assert!(steps[0].env.is_none());

        let configure = &steps[1];
        assert!(configure.args.contains(&"--host=x86_64-w64-mingw32".to_string()));
        let env = configure.env.as_ref().unwrap();
        assert_eq!(env.get(EnvKey::Libs), Some("-lgdi32"));
        assert_eq!(
            env.get(EnvKey::DestDir),
            Some(base.join("libssh2").display().to_string().as_str())
        );
    }

    /// zlib has no check on windows and libgit2 never has one.
    fn self_test_count(os: TargetOs) -> usize {
        match os {
            TargetOs::Windows => 2,
            TargetOs::Linux | TargetOs::Darwin => 3,
        }
    }

    #[test]
    fn test_no_check_skips_self_tests() {
        for os in TargetOs::ALL {
            let expected = self_test_count(os);
            for no_check in [false, true] {
                let session = Session::new();
                let options = BuildOptions::new(os, TargetCpu::X86_64).with_no_check(no_check);
                let mut runner = RecordingRunner::new();
                session.run(&options, &mut runner).unwrap();

                let checks = runner.steps().iter().filter(|s| s.kind == StepKind::Check).count();
                assert_eq!(checks, if no_check { 0 } else { expected }, "{} no_check={}", os, no_check);
            }
        }
    }

    #[test]
    fn test_windows_zlib_uses_mingw_makefile() {
        let session = Session::new();
        let options = BuildOptions::new(TargetOs::Windows, TargetCpu::X86);
        let mut runner = RecordingRunner::new();
        session.run(&options, &mut runner).unwrap();
        let base = session.base();

        let zlib = steps_of(runner.steps(), &base, Dependency::Zlib);
        assert_eq!(zlib.len(), 1);
        assert!(zlib[0].args.contains(&"LOC=-m32".to_string()));
        assert!(zlib[0].args.contains(&"win32/Makefile.gcc".to_string()));
        assert!(base.join("zlib/lib/libz.a").is_file());
        assert!(base.join("zlib/include/zconf.h").is_file());

        let makefile = std::fs::read_to_string(base.join("zlib.build/win32/Makefile.gcc")).unwrap();
        assert!(makefile.contains("#PREFIX ="));

        let libgit2 = steps_of(runner.steps(), &base, Dependency::Libgit2);
        assert!(libgit2[0].args.contains(&"MINGW=1".to_string()));
    }

    #[test]
    fn test_failure_stops_the_session() {
        let session = Session::new();
        let options = BuildOptions::new(TargetOs::Darwin, TargetCpu::X86_64);
        let mut runner = RecordingRunner::new().fail_when(|step| {
            step.kind == StepKind::Build
                && step.cwd.ends_with("openssl.build")
                && step.args.is_empty()
        });

        let err = session.run(&options, &mut runner).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to build `openssl`"));

        let base = session.base();
        assert!(base.join("openssl.build").exists());
        assert!(!base.join("libssh2.build").exists());
        assert!(!base.join("libgit2.build").exists());
        assert!(steps_of(runner.steps(), &base, Dependency::Libssh2).is_empty());
    }

    #[test]
    fn test_missing_vendor_fails_before_any_step() {
        let session = Session::new();
        std::fs::remove_dir_all(session.vendor.root().join("libssh2")).unwrap();
        let options = BuildOptions::new(TargetOs::Linux, TargetCpu::X86_64);
        let mut runner = RecordingRunner::new();

        let err = session.run(&options, &mut runner).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingVendorSource {
                dependency: Dependency::Libssh2,
                ..
            })
        ));
        assert!(runner.steps().is_empty());
        assert_eq!(runner.preflight_calls(), 0);
    }

    #[test]
    fn test_cache_restores_without_building() {
        let session = Session::new();
        let cache = TarballCache::new(session.tmp.path().join("cache"));
        let options = BuildOptions::new(TargetOs::Linux, TargetCpu::X86_64);

        let mut first = RecordingRunner::new();
        let outcome = Pipeline::new(
            &session.resolver,
            &options,
            SourcePreparer::new(session.vendor.root()),
            session.base(),
            &mut first,
        )
        .with_cache(&cache)
        .run()
        .unwrap();
        assert!(outcome.restored.is_empty());

        std::fs::remove_dir_all(session.base()).unwrap();
        // Vendor sources are not needed for a fully cached session.
        std::fs::remove_dir_all(session.vendor.root()).unwrap();

        let mut second = RecordingRunner::new();
        let outcome = Pipeline::new(
            &session.resolver,
            &options,
            SourcePreparer::new(session.vendor.root()),
            session.base(),
            &mut second,
        )
        .with_cache(&cache)
        .run()
        .unwrap();

        assert_eq!(outcome.restored, Dependency::ORDER.to_vec());
        assert!(outcome.prepared.is_empty());
        assert!(second.steps().is_empty());
        assert_eq!(second.preflight_calls(), 0);
        assert!(session.base().join("libgit2/lib/libgit2.a").is_file());
        assert!(session.base().join("zlib/lib").is_dir());
    }
}
