use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "nmv",
    about = "Network-maintenance verification: scheduled state collection from switch fleets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the scheduler and the status API.
    Serve {
        /// Path to the schedule file (jobs + fetcher source bindings).
        #[arg(long, default_value = "config/schedule.yml")]
        schedule: PathBuf,

        /// Maintenance window the scheduled jobs collect for.
        #[arg(long, env = "MAINTENANCE_ID")]
        maintenance_id: String,

        /// Use the in-memory store instead of Postgres (development only).
        #[arg(long)]
        memory_store: bool,
    },

    /// Run a single collection cycle and print the report.
    Collect {
        /// Indicator to collect (e.g. get_fan_hpe_dna, ping_batch).
        #[arg(long)]
        api_name: String,

        #[arg(long, env = "MAINTENANCE_ID")]
        maintenance_id: String,

        /// Source group for the HTTP fetcher (e.g. DNA, FNA).
        #[arg(long)]
        source: Option<String>,

        /// Use the in-memory store instead of Postgres (development only).
        #[arg(long)]
        memory_store: bool,
    },

    /// List every registered parser key.
    Parsers,
}
