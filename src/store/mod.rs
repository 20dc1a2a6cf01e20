//! Durable storage plumbing
//!
//! Everything the orchestrator persists or reads lives behind an
//! `object_store` backend: the tracker state blob, the per-run manifests,
//! and the partitioned CDC stream itself.
//!
//! # Overview
//!
//! - `StoreLocation` - URL parsing for S3/R2/GCS/Azure/local backends
//! - `StateStore` - get/put interface for the tracker state blob
//! - `ObjectStateStore` / `MemoryStateStore` - production and test impls

mod location;
mod state_store;

pub use location::StoreLocation;
pub use state_store::{MemoryStateStore, ObjectStateStore, StateStore};
