//! OpenSSL, linked against zlib.

use anyhow::Result;

use super::Stage;
use crate::builder::env::BuildEnv;
use crate::builder::step::StepKind;
use crate::core::Dependency;

/// Ciphers and features left out of the static build.
const DISABLED: [&str; 4] = ["no-idea", "no-mdc2", "no-rc5", "no-shared"];

pub(super) fn build(stage: &mut Stage<'_>) -> Result<()> {
    let zlib = stage.upstream(Dependency::Zlib)?.to_path_buf();
    let env = BuildEnv::new().cc(&stage.toolchain.cc);

    let configure = stage
        .script(StepKind::Configure, "Configure")
        .arg(format!("--prefix={}", stage.install_dir.display()))
        .args(DISABLED)
        .arg("zlib")
        .arg(stage.toolchain.tls_platform_id.as_str())
        .args(stage.toolchain.cflags_args())
        .arg(format!("-I{}/include", zlib.display()))
        .arg(format!("-L{}/lib", zlib.display()))
        .arg("-lz")
        .env(&env);
    stage.run(configure)?;

    stage.run(stage.make(StepKind::Build).arg("depend"))?;
    // Parallel make breaks the OpenSSL build on darwin.
    stage.run(stage.make(StepKind::Build))?;
    stage.check(stage.make(StepKind::Check).arg("test"))?;
    stage.run(stage.make(StepKind::Install).arg("install"))?;
    Ok(())
}
