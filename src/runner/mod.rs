//! Batch job execution service interface
//!
//! The orchestrator never runs the batch transform itself; it starts runs
//! on an external execution service and polls them. Concurrency-limit
//! rejections are a typed error (`Error::ConcurrencyLimitExceeded`) rather
//! than a message substring, so the tracker can treat them as the expected
//! non-fatal race they are.

mod http;
mod mock;


pub use http::{HttpJobRunner, HttpJobRunnerConfig};
pub use mock::MockJobRunner;

use crate::error::Result;
use crate::types::RunState;
use async_trait::async_trait;
use std::collections::HashMap;

/// External batch execution service
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Start a run of `job_name` with the given parameters.
    ///
    /// Returns the run id. A start rejected for exceeding the service's
    /// concurrent-run limit must surface as
    /// `Error::ConcurrencyLimitExceeded`; any other failure is fatal to
    /// the tick.
    async fn start(&self, job_name: &str, parameters: &HashMap<String, String>) -> Result<String>;

    /// Poll the current state of a run
    async fn poll(&self, job_name: &str, run_id: &str) -> Result<RunState>;
}
