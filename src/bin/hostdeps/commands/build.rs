//! `hostdeps build` command

use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{bail, Result};

use super::load_layout;
use crate::cli::BuildArgs;
use hostdeps::builder::{Pipeline, PlatformResolver, ProcessRunner, SourcePreparer, TarballCache};
use hostdeps::core::BuildOptions;
use hostdeps::util::fs::list_files;
use hostdeps::util::shell::Status;
use hostdeps::util::Shell;

pub fn execute(args: BuildArgs, shell: &Shell, config: Option<&Path>) -> Result<()> {
    let layout = load_layout(config, &args.paths)?;

    // Jobs: CLI > config > available parallelism
    let jobs = match args.jobs {
        Some(n) => match NonZeroUsize::new(n) {
            Some(n) => n,
            None => bail!("`--jobs` must be at least 1"),
        },
        None => layout.jobs(),
    };

    let options = BuildOptions::parse(&args.target.os, &args.target.cpu)?
        .with_jobs(jobs)
        .with_no_check(args.no_check || layout.no_check());

    if options.no_check() {
        shell.warn("self-tests are disabled");
    }

    let resolver = PlatformResolver::new(layout.toolchain_root()?);
    let preparer = SourcePreparer::new(layout.vendor_root()?);
    let build_base = layout.build_base(options.target_platform());
    let cache = if args.no_cache {
        None
    } else {
        layout.cache_dir().map(TarballCache::new)
    };

    if let Some(cache) = &cache {
        tracing::debug!("artifact cache: {}", cache.dir().display());
    }

    let mut runner = ProcessRunner::new(shell.is_verbose());
    let mut pipeline = Pipeline::new(&resolver, &options, preparer, &build_base, &mut runner)
        .with_reporter(shell);
    if let Some(cache) = &cache {
        pipeline = pipeline.with_cache(cache);
    }
    let outcome = pipeline.run()?;

    if shell.is_verbose() {
        for (dep, dir) in outcome.paths.installs() {
            let files = list_files(dir)?.len();
            shell.note(format!("{} installed {} files under {}", dep, files, dir.display()));
        }
    }

    shell.status(
        Status::Finished,
        format!(
            "{} ({} built, {} restored) in {}",
            options.target_platform(),
            outcome.prepared.len(),
            outcome.restored.len(),
            build_base.display()
        ),
    );
    Ok(())
}
