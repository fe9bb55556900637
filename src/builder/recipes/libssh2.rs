//! libssh2, linked against OpenSSL and zlib.

use anyhow::Result;

use super::Stage;
use crate::builder::env::BuildEnv;
use crate::builder::step::StepKind;
use crate::core::{Dependency, TargetOs};

/// System libraries the static libssh2 needs at link time.
fn system_libs(os: TargetOs) -> Option<&'static str> {
    match os {
        TargetOs::Windows => Some("-lgdi32"),
        TargetOs::Linux => Some("-ldl"),
        TargetOs::Darwin => None,
    }
}

pub(super) fn build(stage: &mut Stage<'_>) -> Result<()> {
    let zlib = stage.upstream(Dependency::Zlib)?.to_path_buf();
    let openssl = stage.upstream(Dependency::Openssl)?.to_path_buf();

    stage.run(stage.script(StepKind::Bootstrap, "buildconf"))?;

    let env = BuildEnv::new()
        .cc(&stage.toolchain.cc)
        .cflags(format!(
            "{} -I{}/include -I{}/include",
            stage.toolchain.cflags,
            openssl.display(),
            zlib.display()
        ))
        .ldflags(format!(
            "-L{}/lib -L{}/lib -lz",
            openssl.display(),
            zlib.display()
        ))
        .dest_dir(&stage.install_dir)
        .search_path(stage.toolchain.search_path.as_str())
        .libs(system_libs(stage.options.target_os()));

    let configure = stage
        .script(StepKind::Configure, "configure")
        .arg("--prefix=/")
        .arg(format!("--host={}", stage.toolchain.configure_host))
        .args(["--disable-shared", "--disable-examples-build"])
        .arg(format!("--with-libssl-prefix={}", openssl.display()))
        .arg(format!("--with-libz={}", zlib.display()))
        .env(&env);
    stage.run(configure)?;
    stage.run(stage.make_parallel(StepKind::Build).env(&env))?;
    stage.check(stage.make(StepKind::Check).arg("check").env(&env))?;
    stage.run(stage.make(StepKind::Install).arg("install").env(&env))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_libs() {
        assert_eq!(system_libs(TargetOs::Windows), Some("-lgdi32"));
        assert_eq!(system_libs(TargetOs::Linux), Some("-ldl"));
        assert_eq!(system_libs(TargetOs::Darwin), None);
    }
}
