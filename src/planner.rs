//! Window planning
//!
//! Given a table's committed cursor and an ordered listing of candidate
//! artifacts, compute the next bounded processing window. This is a pure
//! function: the tracker performs the listing and hands the result in, so
//! planning is unit testable without any external service.
//!
//! Successive plans over a monotonically advancing cursor never overlap
//! and never skip an artifact that existed at call time inside the
//! selected window.

use crate::source::{ArtifactKind, SourceArtifact};
use chrono::{DateTime, Duration, Utc};

/// Bounds on how much work a single run may take on
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of artifacts per window per table
    pub max_batch_artifacts: usize,
    /// Maximum width of a window; also how far an empty window advances
    pub max_window_interval: Duration,
    /// Artifacts newer than `now - safety_lag` are considered possibly
    /// still in flight and left for a later run
    pub safety_lag: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_batch_artifacts: 500,
            max_window_interval: Duration::hours(1),
            safety_lag: Duration::minutes(2),
        }
    }
}

/// The planned window for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPlan {
    /// Source table name
    pub table: String,
    /// Exclusive lower bound (the committed cursor at planning time)
    pub start_after: DateTime<Utc>,
    /// Inclusive upper bound; becomes the staged cursor on start
    pub end_until: DateTime<Utc>,
    /// Artifacts assigned to this window, in key order
    pub artifacts: Vec<SourceArtifact>,
}

impl WindowPlan {
    /// Whether this plan moves the cursor forward
    pub fn advances(&self) -> bool {
        self.end_until > self.start_after
    }
}

/// Compute the next processing window for one table.
///
/// `listing` must be the ordered artifact listing strictly after
/// `last_committed`; artifacts at or before the cursor are filtered out
/// again here so a sloppy listing cannot regress the window.
///
/// Selection:
/// 1. Drop full-load artifacts and anything newer than `now - safety_lag`.
/// 2. Keep at most `max_batch_artifacts`.
/// 3. Keep nothing beyond `oldest + max_window_interval`.
///
/// The upper bound is the last selected artifact's timestamp, or, when
/// nothing is eligible, `min(last_committed + max_window_interval,
/// now - safety_lag)` floored at the cursor — so a standing gap in the
/// stream still advances the cursor instead of stalling forever, without
/// ever racing ahead of data that may still arrive.
pub fn plan_window(
    table: &str,
    last_committed: DateTime<Utc>,
    listing: &[SourceArtifact],
    now: DateTime<Utc>,
    config: &PlannerConfig,
) -> WindowPlan {
    let ready_until = now - config.safety_lag;

    let mut selected: Vec<SourceArtifact> = Vec::new();
    for artifact in listing {
        if artifact.kind == ArtifactKind::FullLoad {
            continue;
        }
        if artifact.timestamp <= last_committed || artifact.timestamp > ready_until {
            continue;
        }
        if let Some(oldest) = selected.first() {
            if artifact.timestamp > oldest.timestamp + config.max_window_interval {
                break;
            }
        }
        if selected.len() == config.max_batch_artifacts {
            break;
        }
        selected.push(artifact.clone());
    }

    let end_until = match selected.last() {
        Some(last) => last.timestamp,
        None => {
            let horizon = (last_committed + config.max_window_interval).min(ready_until);
            horizon.max(last_committed)
        }
    };

    WindowPlan {
        table: table.to_string(),
        start_after: last_committed,
        end_until,
        artifacts: selected,
    }
}
