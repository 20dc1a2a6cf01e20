//! Orchestrator configuration
//!
//! One YAML document describes a tracked pipeline: where the state blob
//! and manifests live, where the partitioned stream is, which tables to
//! track, and how to reach the execution service.

use crate::error::{Error, Result};
use crate::planner::PlannerConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete orchestrator configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Name of the batch job on the execution service
    pub job_name: String,

    /// Location holding the tracker state blob
    pub state_url: String,

    /// Key of the state blob inside `state_url`
    #[serde(default = "default_state_key")]
    pub state_key: String,

    /// Directory the per-run manifests are written to
    pub manifest_url: String,

    /// Root of the partitioned CDC stream (per-table prefixes below it)
    pub source_url: String,

    /// Source tables to track
    pub tables: Vec<String>,

    /// Immutable lower bound; no data before this is ever processed
    pub epoch_time: DateTime<Utc>,

    /// Maximum artifacts per window per table
    #[serde(default = "default_max_batch_artifacts")]
    pub max_batch_artifacts: usize,

    /// Maximum window width in seconds; also the empty-window advance
    #[serde(default = "default_max_window_interval_secs")]
    pub max_window_interval_secs: u64,

    /// Artifacts younger than this many seconds are left for a later run
    #[serde(default = "default_safety_lag_secs")]
    pub safety_lag_secs: u64,

    /// Interval between ticks in loop mode, in seconds
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Execution service settings
    pub runner: RunnerConfig,
}

/// Execution service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Base URL of the execution service
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_runner_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_state_key() -> String {
    "tracker.json".to_string()
}

fn default_max_batch_artifacts() -> usize {
    500
}

fn default_max_window_interval_secs() -> u64 {
    3600
}

fn default_safety_lag_secs() -> u64 {
    120
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_runner_timeout_secs() -> u64 {
    30
}

impl OrchestratorConfig {
    /// Load a configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&contents)
    }

    /// Parse a configuration from a YAML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the type system cannot express
    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(Error::InvalidConfigValue {
                field: "tables".to_string(),
                message: "at least one tracked table is required".to_string(),
            });
        }
        if self.max_batch_artifacts == 0 {
            return Err(Error::InvalidConfigValue {
                field: "max_batch_artifacts".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_window_interval_secs == 0 {
            return Err(Error::InvalidConfigValue {
                field: "max_window_interval_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.tick_interval_secs == 0 {
            return Err(Error::InvalidConfigValue {
                field: "tick_interval_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// The planner bounds derived from this configuration
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            max_batch_artifacts: self.max_batch_artifacts,
            max_window_interval: chrono::Duration::seconds(self.max_window_interval_secs as i64),
            safety_lag: chrono::Duration::seconds(self.safety_lag_secs as i64),
        }
    }
}
