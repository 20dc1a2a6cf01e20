//! End-to-end orchestration tests
//!
//! Exercise the full tick loop against in-memory collaborators: a
//! partitioned source, a manifest writer, a state store, and a scripted
//! job runner. Each test mirrors an operational scenario the orchestrator
//! has to survive.

use cdc_orchestrator::manifest::{manifest_key, MemoryManifestWriter};
use cdc_orchestrator::planner::PlannerConfig;
use cdc_orchestrator::runner::MockJobRunner;
use cdc_orchestrator::source::{MemorySource, PartitionedSource};
use cdc_orchestrator::state::{TrackerState, TrackerStateManager};
use cdc_orchestrator::store::MemoryStateStore;
use cdc_orchestrator::tracker::CdcTracker;
use cdc_orchestrator::types::{RunState, TickOutcome};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::Arc;

const STATE_KEY: &str = "tracker.json";

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
}

fn minute(m: u32) -> DateTime<Utc> {
    epoch() + Duration::minutes(m as i64)
}

struct Pipeline {
    tracker: CdcTracker,
    store: Arc<MemoryStateStore>,
    runner: Arc<MockJobRunner>,
    manifests: Arc<MemoryManifestWriter>,
}

fn pipeline(sources: Vec<MemorySource>, tables: &[&str], max_batch: usize) -> Pipeline {
    let store = Arc::new(MemoryStateStore::new());
    let runner = Arc::new(MockJobRunner::new());
    let manifests = Arc::new(MemoryManifestWriter::new());

    let sources: BTreeMap<String, Arc<dyn PartitionedSource>> = tables
        .iter()
        .zip(sources)
        .map(|(table, source)| {
            (
                (*table).to_string(),
                Arc::new(source) as Arc<dyn PartitionedSource>,
            )
        })
        .collect();

    let tracker = CdcTracker::new(
        TrackerStateManager::new(store.clone(), STATE_KEY),
        sources,
        manifests.clone(),
        runner.clone(),
        PlannerConfig {
            max_batch_artifacts: max_batch,
            max_window_interval: Duration::hours(1),
            safety_lag: Duration::minutes(2),
        },
        "incremental-load",
        epoch(),
    );

    Pipeline {
        tracker,
        store,
        runner,
        manifests,
    }
}

fn load_state(store: &Arc<MemoryStateStore>) -> TrackerState {
    serde_json::from_slice(&store.snapshot(STATE_KEY).expect("state persisted")).unwrap()
}

#[tokio::test]
async fn drains_backlog_across_runs_without_overlap_or_loss() {
    let source = (1..=7).fold(MemorySource::new("accounts"), |s, m| {
        s.with_artifact_at(minute(m))
    });
    let p = pipeline(vec![source], &["accounts"], 3);

    let mut windows: Vec<(DateTime<Utc>, DateTime<Utc>, usize)> = Vec::new();
    let mut uris_seen: Vec<String> = Vec::new();

    // first tick starts; each later tick commits and starts the next run
    for tick in 0..3 {
        if tick > 0 {
            p.runner.script_polls([RunState::Succeeded]);
        }
        let outcome = p.tracker.tick().await.unwrap();
        let TickOutcome::Started { sequence_id, windows: summaries, .. } = outcome else {
            panic!("expected a started run on tick {tick}");
        };
        assert_eq!(sequence_id, tick as u64 + 1);

        let manifest = p.manifests.written(&manifest_key(sequence_id)).unwrap();
        let todo = &manifest.todo_list[0];
        uris_seen.extend(todo.s3uri_list.iter().cloned());
        windows.push((todo.start_after, todo.end_until, todo.s3uri_list.len()));
        assert_eq!(summaries[0].artifact_count, todo.s3uri_list.len());
    }

    // windows are contiguous and bounded
    for pair in windows.windows(2) {
        assert_eq!(pair[0].1, pair[1].0);
    }
    assert!(windows.iter().all(|w| w.2 <= 3));

    // all seven artifacts were assigned exactly once
    assert_eq!(uris_seen.len(), 7);
    let mut deduped = uris_seen.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), 7);
}

#[tokio::test]
async fn survives_restart_with_run_in_flight() {
    let source = MemorySource::new("accounts")
        .with_artifact_at(minute(1))
        .with_artifact_at(minute(2));
    let p = pipeline(vec![source], &["accounts"], 10);

    p.tracker.tick().await.unwrap();

    // "restart": a new tracker against the same store and runner
    let restarted = CdcTracker::new(
        TrackerStateManager::new(p.store.clone(), STATE_KEY),
        {
            let source = MemorySource::new("accounts")
                .with_artifact_at(minute(1))
                .with_artifact_at(minute(2));
            let mut map: BTreeMap<String, Arc<dyn PartitionedSource>> = BTreeMap::new();
            map.insert("accounts".to_string(), Arc::new(source));
            map
        },
        p.manifests.clone(),
        p.runner.clone(),
        PlannerConfig::default(),
        "incremental-load",
        epoch(),
    );

    p.runner.script_polls([RunState::Running]);
    let outcome = restarted.tick().await.unwrap();
    assert_eq!(
        outcome,
        TickOutcome::StillRunning {
            run_id: "run-1".to_string(),
            state: RunState::Running,
        }
    );

    // terminal poll commits the staged cursor computed before the restart
    p.runner.script_polls([RunState::Succeeded]);
    restarted.tick().await.unwrap();
    let state = load_state(&p.store);
    assert_eq!(
        state.table_trackers["accounts"].last_committed_time,
        minute(2)
    );
}

#[tokio::test]
async fn concurrency_conflict_retries_on_next_tick() {
    let source = MemorySource::new("accounts").with_artifact_at(minute(1));
    let p = pipeline(vec![source], &["accounts"], 10);

    p.runner.reject_next_starts(1);
    let outcome = p.tracker.tick().await.unwrap();
    assert_eq!(outcome, TickOutcome::Deferred);

    let state = load_state(&p.store);
    assert_eq!(state.last_sequence_id, 0);
    assert!(state.ready_to_run);

    // same window, same sequence id on the retry
    let outcome = p.tracker.tick().await.unwrap();
    let TickOutcome::Started { sequence_id, run_id, .. } = outcome else {
        panic!("expected Started after the conflict cleared");
    };
    assert_eq!(sequence_id, 1);
    assert_eq!(run_id, "run-1");
}

#[tokio::test]
async fn failed_and_succeeded_runs_advance_the_cursor_alike() {
    let source = MemorySource::new("accounts")
        .with_artifact_at(minute(1))
        .with_artifact_at(minute(2))
        .with_artifact_at(minute(3))
        .with_artifact_at(minute(4));
    let p = pipeline(vec![source], &["accounts"], 2);

    p.tracker.tick().await.unwrap();

    for terminal in [RunState::Failed, RunState::Succeeded] {
        p.runner.script_polls([terminal]);
        p.tracker.tick().await.unwrap();
    }

    let state = load_state(&p.store);
    assert_eq!(
        state.table_trackers["accounts"].last_committed_time,
        minute(4)
    );
}

#[tokio::test]
async fn quiet_stream_advances_horizon_without_data() {
    // a gap in the stream: runs advance the horizon interval by interval
    let p = pipeline(vec![MemorySource::new("accounts")], &["accounts"], 10);

    let outcome = p.tracker.tick().await.unwrap();
    let TickOutcome::Started { windows, .. } = outcome else {
        panic!("expected an empty-window run");
    };
    assert_eq!(windows[0].artifact_count, 0);
    assert_eq!(windows[0].end_until, epoch() + Duration::hours(1));

    // manifest still written, with an empty artifact list
    let manifest = p.manifests.written(&manifest_key(1)).unwrap();
    assert!(manifest.todo_list[0].s3uri_list.is_empty());
    assert_eq!(manifest.artifact_count(), 0);
}

#[tokio::test]
async fn multi_table_manifest_is_ordered_and_complete() {
    let accounts = MemorySource::new("accounts").with_artifact_at(minute(5));
    let orders = MemorySource::new("orders");
    let transactions = MemorySource::new("transactions")
        .with_artifact_at(minute(1))
        .with_artifact_at(minute(2));
    let p = pipeline(
        vec![accounts, orders, transactions],
        &["accounts", "orders", "transactions"],
        10,
    );

    p.tracker.tick().await.unwrap();

    let manifest = p.manifests.written(&manifest_key(1)).unwrap();
    let tables: Vec<&str> = manifest
        .todo_list
        .iter()
        .map(|todo| todo.table.as_str())
        .collect();
    assert_eq!(tables, vec!["accounts", "orders", "transactions"]);

    // every tracked table appears, even with nothing to do
    assert_eq!(manifest.todo_list[1].s3uri_list.len(), 0);
    assert_eq!(manifest.todo_list[2].s3uri_list.len(), 2);
}

#[tokio::test]
async fn state_blob_round_trips_identically() {
    let source = MemorySource::new("accounts").with_artifact_at(minute(1));
    let p = pipeline(vec![source], &["accounts"], 10);
    p.tracker.tick().await.unwrap();

    let raw = p.store.snapshot(STATE_KEY).unwrap();
    let state: TrackerState = serde_json::from_slice(&raw).unwrap();
    let reencoded = serde_json::to_vec_pretty(&state).unwrap();

    assert_eq!(raw.as_ref(), reencoded.as_slice());
}
