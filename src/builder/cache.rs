//! Reuse of finished install trees across sessions.
//!
//! An entry is keyed by everything that shapes the produced artifact: the
//! package, the recipe revision, the toolchain descriptor and the keys of
//! the upstream packages it was compiled against. Parallelism and self-test
//! settings don't change the output and are left out, as is the tool
//! search path: past the compiler's own `bin` directory it only carries
//! the host `PATH`.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder};
use tempfile::NamedTempFile;

use crate::builder::toolchain::ToolchainDescriptor;
use crate::core::{Dependency, TargetPlatform};
use crate::util::fs::ensure_dir;
use crate::util::hash::Fingerprint;

/// Bump when any recipe changes what it installs.
pub const RECIPE_REVISION: &str = "1";

/// Storage for archived install trees.
pub trait ArtifactCache {
    fn contains(&self, archive: &str) -> bool;

    /// Populate `dest` with the contents of `archive`.
    fn unpack(&self, archive: &str, dest: &Path) -> Result<()>;

    /// Archive the contents of `src` under `archive`.
    fn store(&self, archive: &str, src: &Path) -> Result<()>;
}

/// Cache key for `dep`, given the keys already computed for its upstream.
pub fn cache_key(
    dep: Dependency,
    toolchain: &ToolchainDescriptor,
    upstream_keys: &BTreeMap<Dependency, String>,
) -> Result<String> {
    let mut fp = Fingerprint::new();
    fp.update_field("package", dep.name())
        .update_field("recipe", RECIPE_REVISION)
        .update_field("platform", toolchain.platform.as_str())
        .update_field("cc", &toolchain.cc.to_string_lossy())
        .update_field("cxx", &toolchain.cxx.to_string_lossy())
        .update_field("sysroot_flags", &toolchain.sysroot_flags)
        .update_field("cflags", &toolchain.cflags)
        .update_field("configure_host", &toolchain.configure_host)
        .update_field("tls_platform_id", &toolchain.tls_platform_id);

    for up in dep.upstream() {
        let key = upstream_keys
            .get(up)
            .with_context(|| format!("no cache key for `{}`, upstream of `{}`", up, dep))?;
        fp.update_field(up.name(), key);
    }

    Ok(fp.finish())
}

/// Archive file name for a cache entry.
pub fn archive_name(dep: Dependency, platform: TargetPlatform, key: &str) -> String {
    let short = &key[..key.len().min(16)];
    format!("{}-{}-{}.tar.gz", dep.name(), platform, short)
}

/// Gzip-compressed tarballs in a directory.
#[derive(Debug, Clone)]
pub struct TarballCache {
    dir: PathBuf,
}

impl TarballCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TarballCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn archive_path(&self, archive: &str) -> PathBuf {
        self.dir.join(archive)
    }
}

impl ArtifactCache for TarballCache {
    fn contains(&self, archive: &str) -> bool {
        self.archive_path(archive).is_file()
    }

    fn unpack(&self, archive: &str, dest: &Path) -> Result<()> {
        let path = self.archive_path(archive);
        let file = File::open(&path)
            .with_context(|| format!("failed to open cached archive: {}", path.display()))?;

        ensure_dir(dest)?;
        Archive::new(GzDecoder::new(file))
            .unpack(dest)
            .with_context(|| format!("failed to unpack {} into {}", path.display(), dest.display()))
    }

    fn store(&self, archive: &str, src: &Path) -> Result<()> {
        ensure_dir(&self.dir)?;
        let path = self.archive_path(archive);

        // Write beside the final name and rename, so readers never see a partial archive.
        let tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("failed to create temp file in {}", self.dir.display()))?;
        {
            let encoder = GzEncoder::new(tmp.as_file(), Compression::default());
            let mut builder = Builder::new(encoder);
            builder
                .append_dir_all(".", src)
                .with_context(|| format!("failed to archive {}", src.display()))?;
            builder.into_inner()?.finish()?;
        }
        tmp.persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to write cached archive: {}", path.display()))?;

        tracing::debug!("cached {} as {}", src.display(), path.display());
        Ok(())
    }
}
