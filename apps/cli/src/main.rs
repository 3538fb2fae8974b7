//! Solguide CLI — consolidated instruction guide generator.
//!
//! Turns a solicitation opportunity's source instruction PDFs into a single
//! consolidated, paginated guide and records the result.

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
