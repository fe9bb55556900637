//! zlib: autoconf on unix-like targets, the bundled mingw makefile on windows.

use std::path::Path;

use anyhow::Result;
use regex::Regex;

use super::Stage;
use crate::builder::env::{BuildEnv, EnvKey};
use crate::builder::errors::BuildError;
use crate::builder::step::StepKind;
use crate::core::TargetOs;
use crate::util::fs::{copy_into, ensure_dir, read_to_string, remove_all_if_exists, write_string};

const MINGW_MAKEFILE: &str = "win32/Makefile.gcc";
const HEADERS: [&str; 2] = ["zlib.h", "zconf.h"];

pub(super) fn build(stage: &mut Stage<'_>) -> Result<()> {
    match stage.options.target_os() {
        TargetOs::Windows => build_mingw(stage),
        TargetOs::Linux | TargetOs::Darwin => build_autoconf(stage),
    }
}

fn build_autoconf(stage: &mut Stage<'_>) -> Result<()> {
    let env = BuildEnv::new()
        .cc(&stage.toolchain.cc)
        .cflags(stage.toolchain.cflags.as_str());

    let configure = stage
        .script(StepKind::Configure, "configure")
        .arg(format!("--prefix={}", stage.install_dir.display()))
        .arg("--static")
        .env(&env);
    stage.run(configure)?;
    stage.run(stage.make_parallel(StepKind::Build).env(&env))?;
    stage.check(stage.make(StepKind::Check).arg("check").env(&env))?;
    stage.run(stage.make(StepKind::Install).arg("install").env(&env))?;

    // Only the library and headers are wanted.
    remove_all_if_exists(&stage.install_dir.join("share"))?;
    remove_all_if_exists(&stage.install_dir.join("lib/pkgconfig"))?;
    Ok(())
}

fn build_mingw(stage: &mut Stage<'_>) -> Result<()> {
    patch_mingw_makefile(&stage.work_dir.join(MINGW_MAKEFILE))?;

    let env = BuildEnv::new().set(EnvKey::Prefix, stage.toolchain.tool_prefix());
    let make = stage
        .make_parallel(StepKind::Build)
        .arg(format!("LOC={}", stage.options.target_cpu().bits_flag()))
        .args(["-f", MINGW_MAKEFILE, "libz.a"])
        .env(&env);
    stage.run(make)?;

    let lib_dir = stage.install_dir.join("lib");
    let include_dir = stage.install_dir.join("include");
    ensure_dir(&lib_dir)?;
    ensure_dir(&include_dir)?;

    copy_artifact(stage, "libz.a", &lib_dir)?;
    for header in HEADERS {
        copy_artifact(stage, header, &include_dir)?;
    }
    Ok(())
}

fn copy_artifact(stage: &Stage<'_>, name: &str, dest: &Path) -> Result<()> {
    let src = stage.work_dir.join(name);
    if !src.is_file() {
        return Err(BuildError::MissingArtifact {
            dependency: stage.dep,
            path: src,
        }
        .into());
    }
    copy_into(&src, dest)?;
    Ok(())
}

/// Comment out the makefile's own `PREFIX` so the one from the environment wins.
pub fn patch_mingw_makefile(path: &Path) -> Result<()> {
    let text = read_to_string(path)?;
    let re = Regex::new(r"(?m)^PREFIX")?;
    let patched = re.replace_all(&text, "#PREFIX");
    if patched != text {
        write_string(path, &patched)?;
    }
    Ok(())
}
