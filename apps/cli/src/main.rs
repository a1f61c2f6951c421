//! Tadka CLI: manage and run the CMS content agents.
//!
//! Registers agents and YouTube channels, runs agents on demand or on a
//! schedule, and inspects what they wrote.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
