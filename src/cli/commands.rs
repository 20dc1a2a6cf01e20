//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CDC incremental-load orchestrator CLI
#[derive(Parser, Debug)]
#[command(name = "cdc-orchestrator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Orchestrator configuration file (YAML)
    #[arg(short, long, global = true, default_value = "orchestrator.yaml")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single scheduling tick and exit
    Tick,

    /// Tick on a fixed interval until interrupted
    Run {
        /// Seconds between ticks (overrides the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Print the persisted tracker state
    Status,

    /// Parse and validate the configuration, then exit
    Validate,
}
