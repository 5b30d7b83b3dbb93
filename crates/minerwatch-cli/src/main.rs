//! MinerWatch CLI - terminal front-end for the miner status monitor.
//!
//! Listens for the UDP status broadcasts miners send on the LAN and shows
//! a live table of their last-known state.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::{exit_codes, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Log to stderr so stdout stays clean for tables and JSON.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "minerwatch_core=warn,minerwatch=warn",
        1 => "minerwatch_core=info,minerwatch=info",
        _ => "minerwatch_core=debug,minerwatch=debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let preferences = commands::load_preferences(cli.data_dir).await?;

    match cli.command {
        Commands::Watch(args) => commands::run_watch(args, preferences, cli.json).await,
        Commands::Scan(args) => commands::run_scan(args, preferences, cli.json).await,
        Commands::Name(args) => commands::run_name(args, preferences, cli.json).await,
        Commands::Port(args) => commands::run_port(args, preferences, cli.json).await,
    }
}
