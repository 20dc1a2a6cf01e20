//! The CDC tracker state machine
//!
//! One `tick()` either plans and starts a new run, or polls the in-flight
//! one and commits on a terminal state. State lives in a single persisted
//! blob; every state-mutating branch flushes it before returning. The only
//! unsafe window is a crash between a successful job start and the flush,
//! which leaves an orphaned run for operator alerting to catch.
//!
//! Single-writer model: exactly one orchestrator instance is assumed to
//! call `tick()` at a time for a tracked pipeline. `tick()` is synchronous
//! and non-reentrant; it performs one plan-and-start or one
//! poll-and-commit per call and keeps no internal retry loop.

use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::manifest::{manifest_key, ManifestWriter, ObjectManifestWriter, RunManifest};
use crate::planner::{plan_window, PlannerConfig, WindowPlan};
use crate::runner::{HttpJobRunner, HttpJobRunnerConfig, JobRunner};
use crate::source::{ObjectPartitionedSource, PartitionedSource};
use crate::state::{TrackerState, TrackerStateManager};
use crate::store::{ObjectStateStore, StoreLocation};
use crate::types::{TickOutcome, WindowSummary};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

/// Parameter key naming the manifest the batch job must read
pub const MANIFEST_URI_PARAM: &str = "manifest_uri";

/// Orchestrates run planning, launching, polling, and cursor commits
pub struct CdcTracker {
    state_manager: TrackerStateManager,
    sources: BTreeMap<String, Arc<dyn PartitionedSource>>,
    manifest_writer: Arc<dyn ManifestWriter>,
    job_runner: Arc<dyn JobRunner>,
    planner_config: PlannerConfig,
    job_name: String,
    epoch_time: DateTime<Utc>,
}

impl CdcTracker {
    /// Assemble a tracker from its collaborators
    pub fn new(
        state_manager: TrackerStateManager,
        sources: BTreeMap<String, Arc<dyn PartitionedSource>>,
        manifest_writer: Arc<dyn ManifestWriter>,
        job_runner: Arc<dyn JobRunner>,
        planner_config: PlannerConfig,
        job_name: impl Into<String>,
        epoch_time: DateTime<Utc>,
    ) -> Self {
        Self {
            state_manager,
            sources,
            manifest_writer,
            job_runner,
            planner_config,
            job_name: job_name.into(),
            epoch_time,
        }
    }

    /// Wire up a tracker against real object stores and the HTTP runner
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self> {
        config.validate()?;

        let state_location = StoreLocation::parse(&config.state_url)?;
        let state_manager = TrackerStateManager::new(
            Arc::new(ObjectStateStore::new(state_location)),
            config.state_key.clone(),
        );

        let source_location = StoreLocation::parse(&config.source_url)?;
        let sources: BTreeMap<String, Arc<dyn PartitionedSource>> = config
            .tables
            .iter()
            .map(|table| {
                let source: Arc<dyn PartitionedSource> = Arc::new(ObjectPartitionedSource::new(
                    source_location.clone(),
                    table.clone(),
                ));
                (table.clone(), source)
            })
            .collect();

        let manifest_location = StoreLocation::parse(&config.manifest_url)?;
        let manifest_writer = Arc::new(ObjectManifestWriter::new(manifest_location));

        let job_runner = Arc::new(HttpJobRunner::new(HttpJobRunnerConfig {
            base_url: config.runner.base_url.clone(),
            timeout: std::time::Duration::from_secs(config.runner.timeout_secs),
        })?);

        Ok(Self::new(
            state_manager,
            sources,
            manifest_writer,
            job_runner,
            config.planner_config(),
            config.job_name.clone(),
            config.epoch_time,
        ))
    }

    /// Run one scheduling step.
    ///
    /// Reads the persisted state, then either plans and starts a run
    /// (`ready_to_run`) or polls the in-flight run and, on a terminal
    /// state, commits cursors and immediately starts the next run in the
    /// same call. Only the start-time concurrency conflict is swallowed;
    /// every other failure propagates so the caller can alert.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let mut state = self
            .state_manager
            .load_or_init(self.epoch_time, self.sources.keys().cloned())
            .await?;

        let outcome = if state.ready_to_run {
            self.plan_and_start(&mut state).await?
        } else {
            self.poll_and_commit(&mut state).await?
        };

        info!("{outcome}");
        Ok(outcome)
    }

    /// Plan every table's window, write the manifest, and start a run.
    ///
    /// Manifest write happens strictly before the start call; the job must
    /// never start against an unwritten manifest. State is persisted only
    /// after the start call succeeds.
    async fn plan_and_start(&self, state: &mut TrackerState) -> Result<TickOutcome> {
        let now = Utc::now();

        let mut plans: Vec<WindowPlan> = Vec::with_capacity(state.table_trackers.len());
        for (table, tracker) in &state.table_trackers {
            let source = self.sources.get(table).ok_or_else(|| {
                Error::config(format!("no source configured for tracked table '{table}'"))
            })?;
            let listing = source.list_after(tracker.last_committed_time).await?;
            plans.push(plan_window(
                table,
                tracker.last_committed_time,
                &listing,
                now,
                &self.planner_config,
            ));
        }

        // A run with all-empty windows is still worth starting when it
        // advances the stall-prevention horizon; with nothing to advance
        // either, starting would only burn a sequence id.
        if plans.iter().all(|p| p.artifacts.is_empty() && !p.advances()) {
            return Ok(TickOutcome::Idle);
        }

        let sequence_id = state.next_sequence_id();
        let key = manifest_key(sequence_id);
        let manifest = RunManifest::from_plans(&plans);
        let manifest_uri = self.manifest_writer.write(&key, &manifest).await?;
        info!(
            "wrote manifest {manifest_uri} covering {} artifact(s)",
            manifest.artifact_count()
        );

        let mut parameters = HashMap::new();
        parameters.insert(MANIFEST_URI_PARAM.to_string(), manifest_uri);

        match self.job_runner.start(&self.job_name, &parameters).await {
            Ok(run_id) => {
                let staged: BTreeMap<String, DateTime<Utc>> = plans
                    .iter()
                    .map(|plan| (plan.table.clone(), plan.end_until))
                    .collect();
                state.record_start(run_id.clone(), &staged);
                self.state_manager.save(state).await?;

                Ok(TickOutcome::Started {
                    sequence_id,
                    run_id,
                    windows: plans.iter().map(window_summary).collect(),
                })
            }
            // Expected race with externally triggered runs: leave all
            // state untouched and let the next tick retry.
            Err(e) if e.is_concurrency_limit() => Ok(TickOutcome::Deferred),
            Err(e) => Err(e),
        }
    }

    /// Poll the in-flight run; on a terminal state commit cursors and
    /// immediately plan-and-start the next run.
    async fn poll_and_commit(&self, state: &mut TrackerState) -> Result<TickOutcome> {
        let run_id = state.last_run_id.clone().ok_or_else(|| {
            Error::state_corruption("ready_to_run is false but no run id is recorded")
        })?;

        let run_state = self.job_runner.poll(&self.job_name, &run_id).await?;
        if !run_state.is_terminal() {
            return Ok(TickOutcome::StillRunning {
                run_id,
                state: run_state,
            });
        }

        // Success and failure commit alike; a failed run must not block
        // the pipeline forever, and the transform is idempotent under
        // replays.
        info!("run {run_id} finished with state {run_state}, committing cursors");
        state.commit();
        self.state_manager.save(state).await?;

        self.plan_and_start(state).await
    }
}

fn window_summary(plan: &WindowPlan) -> WindowSummary {
    WindowSummary {
        table: plan.table.clone(),
        start_after: plan.start_after,
        end_until: plan.end_until,
        artifact_count: plan.artifacts.len(),
    }
}
