//! `hostdeps clean` command

use std::path::Path;

use anyhow::{bail, Result};

use super::load_layout;
use crate::cli::CleanArgs;
use hostdeps::core::BuildOptions;
use hostdeps::util::fs::remove_all_if_exists;
use hostdeps::util::shell::Status;
use hostdeps::util::Shell;

pub fn execute(args: CleanArgs, shell: &Shell, config: Option<&Path>) -> Result<()> {
    let layout = load_layout(config, &args.paths)?;
    let dir = match (args.all, args.os.as_deref(), args.cpu.as_deref()) {
        (true, _, _) => layout.build_root().to_path_buf(),
        (false, Some(os), Some(cpu)) => layout.build_base(BuildOptions::parse(os, cpu)?.target_platform()),
        (false, _, _) => bail!("`--os` and `--cpu` are required unless `--all` is given"),
    };

    remove_all_if_exists(&dir)?;
    shell.status(Status::Removed, dir.display());
    Ok(())
}
