mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            schedule,
            maintenance_id,
            memory_store,
        } => commands::serve(schedule, maintenance_id, memory_store).await,
        Command::Collect {
            api_name,
            maintenance_id,
            source,
            memory_store,
        } => commands::collect(api_name, maintenance_id, source, memory_store).await,
        Command::Parsers => commands::parsers(),
    }
}
