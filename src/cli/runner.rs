//! CLI command execution

use super::commands::{Cli, Commands};
use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::store::{ObjectStateStore, StateStore, StoreLocation};
use crate::tracker::CdcTracker;
use std::time::Duration;
use tracing::{error, info};

/// Executes the parsed CLI command
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner from parsed arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Dispatch and run the selected command
    pub async fn run(&self) -> Result<()> {
        let config = OrchestratorConfig::from_file(&self.cli.config)?;

        match &self.cli.command {
            Commands::Tick => self.tick_once(&config).await,
            Commands::Run { interval } => self.run_loop(&config, *interval).await,
            Commands::Status => self.status(&config).await,
            Commands::Validate => {
                println!(
                    "configuration ok: job '{}', {} table(s)",
                    config.job_name,
                    config.tables.len()
                );
                Ok(())
            }
        }
    }

    /// One tick, result on stdout
    async fn tick_once(&self, config: &OrchestratorConfig) -> Result<()> {
        let tracker = CdcTracker::from_config(config)?;
        let outcome = tracker.tick().await?;
        println!("{outcome}");
        Ok(())
    }

    /// The cron loop: tick, sleep, repeat. Tick errors are logged and the
    /// loop keeps going; whether to alert on them is the operator's call.
    async fn run_loop(&self, config: &OrchestratorConfig, interval: Option<u64>) -> Result<()> {
        let tracker = CdcTracker::from_config(config)?;
        let interval = Duration::from_secs(interval.unwrap_or(config.tick_interval_secs));

        info!(
            "orchestrating job '{}' every {}s",
            config.job_name,
            interval.as_secs()
        );
        loop {
            match tracker.tick().await {
                Ok(outcome) => println!("{outcome}"),
                Err(e) => error!("tick failed: {e}"),
            }
            info!("waiting {}s until next tick", interval.as_secs());
            tokio::time::sleep(interval).await;
        }
    }

    /// Print the raw persisted state blob
    async fn status(&self, config: &OrchestratorConfig) -> Result<()> {
        let location = StoreLocation::parse(&config.state_url)?;
        let store = ObjectStateStore::new(location);

        match store.get(&config.state_key).await? {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| Error::state(format!("state blob is not UTF-8: {e}")))?;
                println!("{text}");
                Ok(())
            }
            None => {
                println!("tracker state not initialized yet");
                Ok(())
            }
        }
    }
}
