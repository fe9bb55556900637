//! hostdeps CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use hostdeps::util::Shell;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("hostdeps=debug")
    } else if cli.quiet {
        EnvFilter::new("hostdeps=warn")
    } else {
        EnvFilter::new("hostdeps=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(cli.quiet, cli.verbose);
    let config = cli.config.as_deref();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &shell, config),
        Commands::Toolchain(args) => commands::toolchain::execute(args, config),
        Commands::Clean(args) => commands::clean::execute(args, &shell, config),
    }
}
