//! Common types shared across the orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Run States
// ============================================================================

/// State of a batch job run as reported by the job runner.
///
/// Wire values are the upper-case state names of the runner API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Succeeded,
    Failed,
    Timeout,
    Error,
    Waiting,
}

impl RunState {
    /// Whether no further transition can occur from this state.
    ///
    /// Success and failure are terminal alike: the tracker commits the
    /// cursor on any of these so one bad run never stalls the pipeline.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Stopped
                | RunState::Succeeded
                | RunState::Failed
                | RunState::Timeout
                | RunState::Error
        )
    }

    /// Parse a run state from its wire string
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STARTING" => Some(Self::Starting),
            "RUNNING" => Some(Self::Running),
            "STOPPING" => Some(Self::Stopping),
            "STOPPED" => Some(Self::Stopped),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            "TIMEOUT" => Some(Self::Timeout),
            "ERROR" => Some(Self::Error),
            "WAITING" => Some(Self::Waiting),
            _ => None,
        }
    }

    /// The wire string for this state
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Timeout => "TIMEOUT",
            Self::Error => "ERROR",
            Self::Waiting => "WAITING",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tick Outcomes
// ============================================================================

/// Per-table window summary for operator-facing output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSummary {
    /// Source table name
    pub table: String,
    /// Exclusive lower bound of the window
    pub start_after: DateTime<Utc>,
    /// Inclusive upper bound of the window
    pub end_until: DateTime<Utc>,
    /// Number of artifacts assigned to the run
    pub artifact_count: usize,
}

impl fmt::Display for WindowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ({} .. {}], {} artifact(s)",
            self.table,
            self.start_after.to_rfc3339(),
            self.end_until.to_rfc3339(),
            self.artifact_count
        )
    }
}

/// The decision taken by a single `tick()` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new run was started
    Started {
        /// Sequence id assigned to the run
        sequence_id: u64,
        /// Run id returned by the job runner
        run_id: String,
        /// Per-table windows covered by the run
        windows: Vec<WindowSummary>,
    },

    /// The runner rejected the start with a concurrency limit; no state
    /// changed and the next tick will retry
    Deferred,

    /// The in-flight run has not reached a terminal state yet
    StillRunning {
        /// Run id being polled
        run_id: String,
        /// State reported by the runner
        state: RunState,
    },

    /// No table had new data and no cursor could advance; nothing started
    Idle,
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                sequence_id,
                run_id,
                windows,
            } => {
                write!(f, "started run {sequence_id} (run_id={run_id})")?;
                for window in windows {
                    write!(f, "; {window}")?;
                }
                Ok(())
            }
            Self::Deferred => write!(f, "not started, concurrency limit reached, will retry"),
            Self::StillRunning { run_id, state } => {
                write!(f, "run {run_id} still in progress, state={state}")
            }
            Self::Idle => write!(f, "no new data and no window to advance, nothing to do"),
        }
    }
}
