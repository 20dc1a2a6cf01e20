//! Tracker state model and persistence
//!
//! The tracker's entire coordination mechanism is one externally persisted
//! JSON blob. The state struct here is pure data with pure transition
//! methods; all I/O lives in `TrackerStateManager` so transitions are unit
//! testable without any external service.

mod manager;
mod types;

pub use manager::TrackerStateManager;
pub use types::{TableTracker, TrackerState, STATE_SCHEMA_VERSION};
