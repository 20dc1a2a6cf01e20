//! Time-partitioned CDC source
//!
//! The ingestion side writes change files under per-table prefixes whose
//! keys encode the event time down to the millisecond, so a lexicographic
//! listing is also a chronological one. This module provides the key
//! codec and the "list after cursor" query the window planner consumes.

mod partitioned;
mod types;

pub use partitioned::{MemorySource, ObjectPartitionedSource, PartitionedSource};
pub use types::{
    filename_to_timestamp, is_full_load_filename, timestamp_to_key, ArtifactKind, SourceArtifact,
};
