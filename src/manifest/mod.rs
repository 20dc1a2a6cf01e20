//! Per-run input manifests
//!
//! Every run attempt gets a freshly computed manifest naming, per table,
//! the window bounds and the exact artifacts the batch job must read. A
//! manifest is immutable once written and addressed by the run's sequence
//! id through a reverse-sequence key, so listing the manifest directory
//! shows the newest manifest first.

mod types;
mod writer;

pub use types::{manifest_key, RunManifest, TableTodo};
pub use writer::{ManifestWriter, MemoryManifestWriter, ObjectManifestWriter};
