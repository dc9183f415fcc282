//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use clap::Parser;

pub use commands::Commands;

#[derive(Debug, Parser)]
#[command(name = "airtable-cli", version, about = "Query and update Airtable tables")]
pub struct Cli {
    /// Config file (defaults to <config dir>/airtable-cli/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print progress and enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Run the parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    commands::query::handler::handle_command(cli).await
}
