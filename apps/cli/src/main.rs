//! contentlift CLI: article optimization against top-ranking competitors.
//!
//! Fetches the latest article from the content store, rewrites it in the
//! style of the two best competitor pages, and publishes the result.

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
