use clap::Parser;
use colored::*;
use std::process;
use taxtree::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Verbosity flag sets the default level; TAXTREE_LOG overrides it.
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let log_level = std::env::var("TAXTREE_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<taxtree::TaxtreeError>() {
            Some(taxtree::TaxtreeError::NotFound(_)) => 2,
            Some(taxtree::TaxtreeError::InvalidInput(_)) => 3,
            Some(taxtree::TaxtreeError::Io(_)) => 4,
            Some(taxtree::TaxtreeError::Database(_)) | Some(taxtree::TaxtreeError::Csv(_)) => 5,
            Some(taxtree::TaxtreeError::Corrupt(_)) => 6,
            None => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Taxtable(args) => taxtree::cli::commands::taxtable::run(args),
        Commands::Lineage(args) => taxtree::cli::commands::lineage::run(args),
        Commands::Init(args) => taxtree::cli::commands::init::run(args),
    }
}
