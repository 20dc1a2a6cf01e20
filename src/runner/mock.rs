//! Scripted job runner for tests

use super::JobRunner;
use crate::error::{Error, Result};
use crate::types::RunState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Job runner with scripted start and poll outcomes.
///
/// Starts succeed with run ids `run-1`, `run-2`, ... unless a
/// concurrency-limit rejection is queued. Polls pop scripted states in
/// order; once the script is exhausted the last state repeats.
#[derive(Default)]
pub struct MockJobRunner {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    starts: u64,
    reject_next_starts: u64,
    poll_script: Vec<RunState>,
    started_parameters: Vec<HashMap<String, String>>,
}

impl MockJobRunner {
    /// Create a runner that starts successfully and polls `SUCCEEDED`
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` start calls with a concurrency-limit error
    pub fn reject_next_starts(&self, n: u64) {
        self.inner.lock().unwrap().reject_next_starts = n;
    }

    /// Queue poll results, returned in order
    pub fn script_polls(&self, states: impl IntoIterator<Item = RunState>) {
        let mut inner = self.inner.lock().unwrap();
        // popped from the back
        let mut states: Vec<RunState> = states.into_iter().collect();
        states.reverse();
        inner.poll_script = states;
    }

    /// Number of successful starts so far
    pub fn start_count(&self) -> u64 {
        self.inner.lock().unwrap().starts
    }

    /// Parameters passed to the most recent successful start
    pub fn last_parameters(&self) -> Option<HashMap<String, String>> {
        self.inner.lock().unwrap().started_parameters.last().cloned()
    }
}

#[async_trait]
impl JobRunner for MockJobRunner {
    async fn start(&self, job_name: &str, parameters: &HashMap<String, String>) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_next_starts > 0 {
            inner.reject_next_starts -= 1;
            return Err(Error::concurrency_limit(job_name));
        }
        inner.starts += 1;
        inner.started_parameters.push(parameters.clone());
        Ok(format!("run-{}", inner.starts))
    }

    async fn poll(&self, _job_name: &str, _run_id: &str) -> Result<RunState> {
        let mut inner = self.inner.lock().unwrap();
        match inner.poll_script.len() {
            0 => Ok(RunState::Succeeded),
            1 => Ok(inner.poll_script[0]),
            _ => Ok(inner.poll_script.pop().expect("non-empty script")),
        }
    }
}
