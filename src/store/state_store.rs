//! State blob persistence
//!
//! The tracker state is a single JSON blob behind a get/put interface.
//! Absence of the blob means "not yet initialized" and triggers one-time
//! creation by the state manager.

use super::location::StoreLocation;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// Get/put interface for the persisted tracker state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the blob at `key`, or `None` if it does not exist
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write the blob at `key` as a single atomic put
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;
}

/// State store backed by an `object_store` location
#[derive(Debug, Clone)]
pub struct ObjectStateStore {
    location: StoreLocation,
}

impl ObjectStateStore {
    /// Create a state store rooted at the given location
    pub fn new(location: StoreLocation) -> Self {
        Self { location }
    }
}

#[async_trait]
impl StateStore for ObjectStateStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.location.object_path(key);
        match self.location.store().get(&path).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.location.object_path(key);
        self.location.store().put(&path, data.into()).await?;
        Ok(())
    }
}

/// In-memory state store for tests
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStateStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the raw bytes at `key`, bypassing the async interface
    pub fn snapshot(&self, key: &str) -> Option<Bytes> {
        self.blobs.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.blobs.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }
}
