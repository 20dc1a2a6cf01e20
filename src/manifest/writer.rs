//! Manifest persistence

use super::types::RunManifest;
use crate::error::{Error, Result};
use crate::store::StoreLocation;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// Writes run manifests to the location the batch job reads from
#[async_trait]
pub trait ManifestWriter: Send + Sync {
    /// Write the manifest under `key`, returning the URI the job receives
    async fn write(&self, key: &str, manifest: &RunManifest) -> Result<String>;
}

/// Manifest writer backed by an `object_store` location
#[derive(Debug, Clone)]
pub struct ObjectManifestWriter {
    location: StoreLocation,
}

impl ObjectManifestWriter {
    /// Create a writer rooted at the manifest directory
    pub fn new(location: StoreLocation) -> Self {
        Self { location }
    }
}

#[async_trait]
impl ManifestWriter for ObjectManifestWriter {
    async fn write(&self, key: &str, manifest: &RunManifest) -> Result<String> {
        let contents = serde_json::to_vec_pretty(manifest).map_err(|e| Error::Manifest {
            message: format!("Failed to serialize manifest: {e}"),
        })?;

        let path = self.location.object_path(key);
        self.location
            .store()
            .put(&path, Bytes::from(contents).into())
            .await?;

        Ok(self.location.uri(&path))
    }
}

/// In-memory manifest writer for tests
#[derive(Debug, Default)]
pub struct MemoryManifestWriter {
    manifests: Mutex<HashMap<String, RunManifest>>,
}

impl MemoryManifestWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// The manifest written under `key`, if any
    pub fn written(&self, key: &str) -> Option<RunManifest> {
        self.manifests.lock().unwrap().get(key).cloned()
    }

    /// Number of manifests written
    pub fn count(&self) -> usize {
        self.manifests.lock().unwrap().len()
    }
}

#[async_trait]
impl ManifestWriter for MemoryManifestWriter {
    async fn write(&self, key: &str, manifest: &RunManifest) -> Result<String> {
        self.manifests
            .lock()
            .unwrap()
            .insert(key.to_string(), manifest.clone());
        Ok(format!("mem://manifests/{key}"))
    }
}
