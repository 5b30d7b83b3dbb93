//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// MinerWatch CLI - Monitor LAN miners from their UDP status broadcasts
#[derive(Parser, Debug)]
#[command(name = "minerwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding settings.json (defaults to the platform data dir)
    #[arg(long, global = true, env = "MINERWATCH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Continuously display miners as their reports arrive
    Watch(WatchArgs),

    /// Listen for a while, then print every miner heard
    Scan(ScanArgs),

    /// Custom miner names
    Name(NameArgs),

    /// Saved listening port
    Port(PortArgs),
}

// ==================== Watch / Scan ====================

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// UDP port to listen on (defaults to the saved port)
    #[arg(short, long, env = "MINERWATCH_PORT")]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// UDP port to listen on (defaults to the saved port)
    #[arg(short, long, env = "MINERWATCH_PORT")]
    pub port: Option<u16>,

    /// Listen duration in seconds
    #[arg(short, long, default_value = "15")]
    pub duration: u64,
}

// ==================== Name ====================

#[derive(Args, Debug)]
pub struct NameArgs {
    #[command(subcommand)]
    pub command: NameCommands,
}

#[derive(Subcommand, Debug)]
pub enum NameCommands {
    /// Set a miner's display name (an empty name removes it)
    Set(NameSetArgs),

    /// Show a miner's display name
    Get(NameGetArgs),

    /// List all custom names
    List,

    /// Remove all custom names
    Clear,
}

#[derive(Args, Debug)]
pub struct NameSetArgs {
    /// Miner IP address
    pub ip: String,

    /// Display name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct NameGetArgs {
    /// Miner IP address
    pub ip: String,
}

// ==================== Port ====================

#[derive(Args, Debug)]
pub struct PortArgs {
    #[command(subcommand)]
    pub command: PortCommands,
}

#[derive(Subcommand, Debug)]
pub enum PortCommands {
    /// Show the saved listening port
    Get,

    /// Save a new listening port (1024-65535)
    Set(PortSetArgs),
}

#[derive(Args, Debug)]
pub struct PortSetArgs {
    pub port: u16,
}
