//! Persisted tracker state types
//!
//! These types are serialized to JSON and persisted between ticks.
//! Field names are part of the on-disk schema; do not rename.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version tag for the persisted state schema
pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Cursor tracking for one source table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTracker {
    /// Source table identifier
    pub table: String,

    /// Immutable lower bound; no data before this is ever processed
    pub epoch_time: DateTime<Utc>,

    /// Inclusive high-water mark of data already committed downstream.
    /// Monotonically non-decreasing; only advances on a terminal poll.
    pub last_committed_time: DateTime<Utc>,

    /// Proposed new high-water mark for the run currently in flight.
    /// `None` when this table has no staged window. When set, always
    /// strictly greater than `last_committed_time`.
    #[serde(default)]
    pub staged_next_time: Option<DateTime<Utc>>,
}

impl TableTracker {
    /// Create a tracker with the cursor at its epoch
    pub fn new(table: impl Into<String>, epoch_time: DateTime<Utc>) -> Self {
        Self {
            table: table.into(),
            epoch_time,
            last_committed_time: epoch_time,
            staged_next_time: None,
        }
    }
}

/// Global persisted orchestrator state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    /// Schema version of this blob
    #[serde(default = "default_version")]
    pub version: u32,

    /// Per-table cursor tracking, keyed by table name.
    /// BTreeMap keeps serialization deterministic.
    pub table_trackers: BTreeMap<String, TableTracker>,

    /// Run id of the most recently started run, if any
    #[serde(default)]
    pub last_run_id: Option<String>,

    /// Incremented exactly once per successfully started run
    pub last_sequence_id: u64,

    /// `true` when no run is tracked as in flight
    pub ready_to_run: bool,
}

fn default_version() -> u32 {
    STATE_SCHEMA_VERSION
}

impl TrackerState {
    /// Create the initial state: every cursor at its epoch, ready to run
    pub fn new<S: Into<String>>(
        epoch_time: DateTime<Utc>,
        tables: impl IntoIterator<Item = S>,
    ) -> Self {
        let table_trackers = tables
            .into_iter()
            .map(|table| {
                let table = table.into();
                let tracker = TableTracker::new(table.clone(), epoch_time);
                (table, tracker)
            })
            .collect();

        Self {
            version: STATE_SCHEMA_VERSION,
            table_trackers,
            last_run_id: None,
            last_sequence_id: 0,
            ready_to_run: true,
        }
    }

    /// The sequence id the next successful start will take
    pub fn next_sequence_id(&self) -> u64 {
        self.last_sequence_id + 1
    }

    /// Record a successfully started run.
    ///
    /// Stages the proposed high-water mark for every table that advances
    /// (entries that would not move past the committed cursor stay
    /// unstaged), records the run id, takes the next sequence id, and
    /// marks a run as in flight.
    pub fn record_start(
        &mut self,
        run_id: impl Into<String>,
        staged: &BTreeMap<String, DateTime<Utc>>,
    ) {
        for (table, tracker) in &mut self.table_trackers {
            tracker.staged_next_time = staged
                .get(table)
                .copied()
                .filter(|next| *next > tracker.last_committed_time);
        }
        self.last_run_id = Some(run_id.into());
        self.last_sequence_id += 1;
        self.ready_to_run = false;
    }

    /// Commit the staged cursors after a terminal poll.
    ///
    /// Every staged `staged_next_time` becomes the new
    /// `last_committed_time`; staging is cleared and the tracker is ready
    /// for the next run. Tables with nothing staged keep their cursor.
    pub fn commit(&mut self) {
        for tracker in self.table_trackers.values_mut() {
            if let Some(next) = tracker.staged_next_time.take() {
                tracker.last_committed_time = next;
            }
        }
        self.ready_to_run = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = TrackerState::new(epoch(), ["accounts", "orders"]);

        assert!(state.ready_to_run);
        assert_eq!(state.last_sequence_id, 0);
        assert!(state.last_run_id.is_none());
        assert_eq!(state.table_trackers.len(), 2);

        let accounts = &state.table_trackers["accounts"];
        assert_eq!(accounts.epoch_time, epoch());
        assert_eq!(accounts.last_committed_time, epoch());
        assert!(accounts.staged_next_time.is_none());
    }

    #[test]
    fn test_record_start_stages_and_increments() {
        let mut state = TrackerState::new(epoch(), ["accounts", "orders"]);

        let mut staged = BTreeMap::new();
        staged.insert("accounts".to_string(), ts("2023-01-01T01:00:00Z"));
        staged.insert("orders".to_string(), ts("2023-01-01T00:30:00Z"));
        state.record_start("run-1", &staged);

        assert!(!state.ready_to_run);
        assert_eq!(state.last_sequence_id, 1);
        assert_eq!(state.last_run_id.as_deref(), Some("run-1"));
        assert_eq!(
            state.table_trackers["accounts"].staged_next_time,
            Some(ts("2023-01-01T01:00:00Z"))
        );
    }

    #[test]
    fn test_record_start_never_stages_backwards() {
        let mut state = TrackerState::new(epoch(), ["accounts"]);
        state.table_trackers.get_mut("accounts").unwrap().last_committed_time =
            ts("2023-06-01T00:00:00Z");

        // proposed mark not past the cursor stays unstaged
        let mut staged = BTreeMap::new();
        staged.insert("accounts".to_string(), ts("2023-06-01T00:00:00Z"));
        state.record_start("run-1", &staged);

        assert!(state.table_trackers["accounts"].staged_next_time.is_none());
    }

    #[test]
    fn test_commit_advances_cursors() {
        let mut state = TrackerState::new(epoch(), ["accounts", "orders"]);

        let mut staged = BTreeMap::new();
        staged.insert("accounts".to_string(), ts("2023-01-01T01:00:00Z"));
        state.record_start("run-1", &staged);
        state.commit();

        assert!(state.ready_to_run);
        assert_eq!(
            state.table_trackers["accounts"].last_committed_time,
            ts("2023-01-01T01:00:00Z")
        );
        assert!(state.table_trackers["accounts"].staged_next_time.is_none());
        // orders had nothing staged and keeps its epoch cursor
        assert_eq!(state.table_trackers["orders"].last_committed_time, epoch());
    }

    #[test]
    fn test_sequence_increments_once_per_start() {
        let mut state = TrackerState::new(epoch(), ["accounts"]);
        assert_eq!(state.next_sequence_id(), 1);

        for i in 1..=3u64 {
            let mut staged = BTreeMap::new();
            staged.insert(
                "accounts".to_string(),
                epoch() + chrono::Duration::hours(i as i64),
            );
            state.record_start(format!("run-{i}"), &staged);
            assert_eq!(state.last_sequence_id, i);
            state.commit();
        }
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut state = TrackerState::new(epoch(), ["accounts", "orders"]);
        let mut staged = BTreeMap::new();
        staged.insert("accounts".to_string(), ts("2023-01-01T01:00:00Z"));
        state.record_start("jr_abc123", &staged);

        let json = serde_json::to_string_pretty(&state).unwrap();
        let restored: TrackerState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, restored);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let state = TrackerState::new(epoch(), ["zulu", "alpha", "mike"]);

        let a = serde_json::to_string(&state).unwrap();
        let b = serde_json::to_string(&serde_json::from_str::<TrackerState>(&a).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wire_field_names() {
        let state = TrackerState::new(epoch(), ["accounts"]);
        let value = serde_json::to_value(&state).unwrap();

        assert!(value.get("table_trackers").is_some());
        assert!(value.get("last_run_id").is_some());
        assert!(value.get("last_sequence_id").is_some());
        assert!(value.get("ready_to_run").is_some());

        let tracker = &value["table_trackers"]["accounts"];
        assert!(tracker.get("epoch_time").is_some());
        assert!(tracker.get("last_committed_time").is_some());
        assert!(tracker.get("staged_next_time").is_some());
    }
}
