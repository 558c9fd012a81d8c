//! Command-line interface

pub mod prices;
pub mod watch;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const FETCH_ERROR: i32 = 3;
}

/// Cryptocurrency price ticker backed by CoinGecko
#[derive(Debug, Parser)]
#[command(name = "coinbar", version, about)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "COINBAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Track these coins instead of the configured ones (comma separated)
    #[arg(long, global = true, value_delimiter = ',')]
    pub coins: Option<Vec<String>>,

    /// Seconds between automatic refreshes
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_output: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch prices once and print them
    Prices(PricesArgs),
    /// Keep refreshing in the terminal until Ctrl-C
    Watch,
}

#[derive(Debug, Args)]
pub struct PricesArgs {
    /// Print prices as JSON
    #[arg(long)]
    pub json: bool,
}
