//! libgit2 with SSL and SSH transports, built from its plain makefile.

use anyhow::Result;

use super::Stage;
use crate::builder::env::{BuildEnv, EnvKey};
use crate::builder::errors::BuildError;
use crate::builder::step::StepKind;
use crate::core::{Dependency, TargetOs};
use crate::util::fs::{copy_dir_all, copy_into, ensure_dir};

const MAKEFILE: &str = "Makefile.crystax";
const DEFINES: &str = "-DGIT_SSL -DOPENSSL_SHA1 -DGIT_SSH";

pub(super) fn build(stage: &mut Stage<'_>) -> Result<()> {
    let includes = [Dependency::Zlib, Dependency::Openssl, Dependency::Libssh2]
        .into_iter()
        .map(|dep| Ok(format!("-I{}/include", stage.upstream(dep)?.display())))
        .collect::<Result<Vec<_>>>()?
        .join(" ");

    let env = BuildEnv::new()
        .cc(&stage.toolchain.cc)
        .set(EnvKey::ExtraCflags, stage.toolchain.cflags.as_str())
        .set(EnvKey::ExtraDefines, DEFINES)
        .set(EnvKey::ExtraIncludes, includes)
        .search_path(stage.toolchain.search_path.as_str());

    let mut make = stage.make(StepKind::Build).args(["-f", MAKEFILE]);
    if stage.options.target_os() == TargetOs::Windows {
        make = make.arg("MINGW=1");
    }
    stage.run(make.env(&env))?;

    install(stage)
}

fn install(stage: &Stage<'_>) -> Result<()> {
    let library = stage.work_dir.join("libgit2.a");
    let header = stage.work_dir.join("include/git2.h");
    let headers = stage.work_dir.join("include/git2");
    for path in [&library, &header, &headers] {
        if !path.exists() {
            return Err(BuildError::MissingArtifact {
                dependency: stage.dep,
                path: path.clone(),
            }
            .into());
        }
    }

    let lib_dir = stage.install_dir.join("lib");
    let include_dir = stage.install_dir.join("include");
    ensure_dir(&lib_dir)?;
    ensure_dir(&include_dir)?;

    copy_into(&library, &lib_dir)?;
    copy_into(&header, &include_dir)?;
    copy_dir_all(&headers, &include_dir.join("git2"))?;
    Ok(())
}
