//! Totem command-line interface
//!
//! Validates governance configuration, replays scripted governance
//! operations against an in-process service and summarizes persisted fact
//! logs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod issuer;
mod script;

use commands::{check_config, run::RunArgs, summarize};

#[derive(Parser)]
#[command(name = "totem")]
#[command(about = "Totem - Tribe Membership Governance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (overridden by TOTEM_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a governance configuration file
    CheckConfig {
        /// Path to the TOML configuration
        path: PathBuf,
    },

    /// Replay a governance script against a fresh service
    Run(RunArgs),

    /// Summarize a fact log written by `run --facts-out`
    Summarize {
        /// Path to the fact log
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("TOTEM_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::CheckConfig { path } => {
            check_config::run(&path)?;
        }

        Commands::Run(args) => {
            commands::run::run(args).await?;
        }

        Commands::Summarize { path } => {
            summarize::run(&path)?;
        }
    }

    Ok(())
}
