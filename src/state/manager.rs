//! Tracker state persistence
//!
//! Loads and saves the whole state blob through a `StateStore`. Every
//! mutation inside a tick is flushed back as one put before the tick
//! returns, so another orchestrator reading the blob never observes a
//! partial update.

use super::types::TrackerState;
use crate::error::{Error, Result};
use crate::store::StateStore;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Reads, initializes, and writes the tracker state blob
pub struct TrackerStateManager {
    store: Arc<dyn StateStore>,
    key: String,
}

impl TrackerStateManager {
    /// Create a manager persisting under `key` in the given store
    pub fn new(store: Arc<dyn StateStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the persisted state, or create and persist the initial state
    /// if the blob does not exist yet.
    pub async fn load_or_init<S: Into<String>>(
        &self,
        epoch_time: DateTime<Utc>,
        tables: impl IntoIterator<Item = S>,
    ) -> Result<TrackerState> {
        match self.store.get(&self.key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| Error::State {
                message: format!("Failed to parse tracker state at '{}': {e}", self.key),
            }),
            None => {
                let state = TrackerState::new(epoch_time, tables);
                self.save(&state).await?;
                Ok(state)
            }
        }
    }

    /// Persist the state as a single pretty-printed JSON put
    pub async fn save(&self, state: &TrackerState) -> Result<()> {
        let contents = serde_json::to_vec_pretty(state).map_err(|e| Error::State {
            message: format!("Failed to serialize tracker state: {e}"),
        })?;
        self.store.put(&self.key, Bytes::from(contents)).await
    }

    /// The key the state blob is stored under
    pub fn key(&self) -> &str {
        &self.key
    }
}
