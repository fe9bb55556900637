//! `hostdeps toolchain` command

use std::path::Path;

use anyhow::Result;

use super::load_layout;
use crate::cli::ToolchainArgs;
use hostdeps::builder::PlatformResolver;
use hostdeps::core::BuildOptions;

pub fn execute(args: ToolchainArgs, config: Option<&Path>) -> Result<()> {
    let layout = load_layout(config, &args.paths)?;
    let options = BuildOptions::parse(&args.target.os, &args.target.cpu)?;
    let descriptor = PlatformResolver::new(layout.toolchain_root()?).descriptor(&options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    println!("Toolchain for {}:", descriptor.platform);
    println!();
    println!("  CC:       {}", descriptor.cc.display());
    println!("  CXX:      {}", descriptor.cxx.display());
    println!("  CFLAGS:   {}", descriptor.cflags);
    if !descriptor.sysroot_flags.is_empty() {
        println!("  Sysroot:  {}", descriptor.sysroot_flags);
    }
    println!("  Host:     {}", descriptor.configure_host);
    println!("  OpenSSL:  {}", descriptor.tls_platform_id);
    println!("  PATH:     {}", descriptor.search_path);

    Ok(())
}
