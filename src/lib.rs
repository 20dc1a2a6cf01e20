//! # CDC Incremental-Load Orchestrator
//!
//! Coordinates repeated, idempotent invocations of a downstream batch
//! transform job against a continuously growing, time-partitioned
//! change-data-capture file stream.
//!
//! Guarantees:
//!
//! - at most one batch run active at a time
//! - each run covers a bounded, contiguous, non-overlapping time window
//!   per tracked source table
//! - progress survives restarts; all coordination state is one externally
//!   persisted JSON blob
//! - after a crash or a failed batch run, forward progress resumes without
//!   reprocessing committed windows or silently dropping new data
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cdc_orchestrator::config::OrchestratorConfig;
//! use cdc_orchestrator::tracker::CdcTracker;
//!
//! #[tokio::main]
//! async fn main() -> cdc_orchestrator::Result<()> {
//!     let config = OrchestratorConfig::from_file("orchestrator.yaml")?;
//!     let tracker = CdcTracker::from_config(&config)?;
//!
//!     // one scheduling step: start, poll, or commit-and-start
//!     let outcome = tracker.tick().await?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CdcTracker.tick()                     │
//! │   ready_to_run ? plan-and-start : poll-and-commit            │
//! └──────────────────────────────────────────────────────────────┘
//!                │              │              │            │
//! ┌──────────────┼──────────────┼──────────────┼────────────┼───┐
//! │  Partitioned │    Window    │   Manifest   │    Job     │ St│
//! │    Source    │    Planner   │    Writer    │   Runner   │at…│
//! ├──────────────┼──────────────┼──────────────┼────────────┼───┤
//! │ list after   │ bounded,     │ reverse-seq  │ start/poll │one│
//! │ cursor key   │ contiguous   │ keyed JSON   │ REST API   │put│
//! └──────────────┴──────────────┴──────────────┴────────────┴───┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the orchestrator
pub mod error;

/// Common types and type aliases
pub mod types;

/// Durable storage plumbing (state blob, object store locations)
pub mod store;

/// Persisted tracker state model and transitions
pub mod state;

/// Time-partitioned CDC source listing
pub mod source;

/// Window planning
pub mod planner;

/// Per-run input manifests
pub mod manifest;

/// Batch job execution service interface
pub mod runner;

/// The orchestration state machine
pub mod tracker;

/// Configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use tracker::CdcTracker;
pub use types::{RunState, TickOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
