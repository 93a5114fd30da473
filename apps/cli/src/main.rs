//! Curriculum builder CLI.
//!
//! Reads a learning-request issue, asks a reasoning service to decompose it
//! into a curriculum, formats it as Markdown and can publish it as a topic
//! issue with linked sub-issues.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
