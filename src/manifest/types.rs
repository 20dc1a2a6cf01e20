//! Manifest wire types and key naming

use crate::planner::WindowPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reverse-sequence base; sequence ids stay well below this
const REVERSE_SEQUENCE_BASE: u64 = 1_000_000_000;

/// The work assigned to the batch job for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTodo {
    /// Source table name
    pub table: String,

    /// Exclusive lower window bound, ISO-8601
    pub start_after: DateTime<Utc>,

    /// Inclusive upper window bound, ISO-8601
    pub end_until: DateTime<Utc>,

    /// URIs of the artifacts inside the window, in key order
    pub s3uri_list: Vec<String>,
}

/// The complete input descriptor for one run attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    /// One entry per tracked table, possibly with an empty artifact list
    pub todo_list: Vec<TableTodo>,
}

impl RunManifest {
    /// Build a manifest from the planned windows, preserving their order
    pub fn from_plans(plans: &[WindowPlan]) -> Self {
        Self {
            todo_list: plans
                .iter()
                .map(|plan| TableTodo {
                    table: plan.table.clone(),
                    start_after: plan.start_after,
                    end_until: plan.end_until,
                    s3uri_list: plan.artifacts.iter().map(|a| a.uri.clone()).collect(),
                })
                .collect(),
        }
    }

    /// Total artifacts across all tables
    pub fn artifact_count(&self) -> usize {
        self.todo_list.iter().map(|todo| todo.s3uri_list.len()).sum()
    }
}

/// Storage key for the manifest of a given run sequence id.
///
/// The key is `zero_pad(BASE - seq)-zero_pad(seq).json`; the descending
/// first component makes a plain lexicographic listing of the manifest
/// directory return the most recent manifest first, which is what an
/// operator inspecting state wants.
///
/// ```text
/// 999999997-000000003.json
/// 999999998-000000002.json
/// 999999999-000000001.json
/// ```
pub fn manifest_key(sequence_id: u64) -> String {
    format!(
        "{:09}-{:09}.json",
        REVERSE_SEQUENCE_BASE - sequence_id,
        sequence_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_manifest_key_format() {
        assert_eq!(manifest_key(1), "999999999-000000001.json");
        assert_eq!(manifest_key(2), "999999998-000000002.json");
        assert_eq!(manifest_key(3), "999999997-000000003.json");
    }

    #[test]
    fn test_manifest_key_lists_newest_first() {
        let mut keys: Vec<String> = (1..=100).map(manifest_key).collect();
        keys.sort();

        assert_eq!(keys[0], manifest_key(100));
        assert_eq!(keys[99], manifest_key(1));
    }

    #[test]
    fn test_manifest_wire_schema() {
        let manifest = RunManifest {
            todo_list: vec![TableTodo {
                table: "accounts".to_string(),
                start_after: "2021-01-01T00:00:00Z".parse().unwrap(),
                end_until: "2021-01-02T00:00:00Z".parse().unwrap(),
                s3uri_list: vec![
                    "s3://bucket/file1".to_string(),
                    "s3://bucket/file2".to_string(),
                ],
            }],
        };

        let value = serde_json::to_value(&manifest).unwrap();
        let todo = &value["todo_list"][0];
        assert_eq!(todo["table"], "accounts");
        assert_eq!(todo["start_after"], "2021-01-01T00:00:00Z");
        assert_eq!(todo["end_until"], "2021-01-02T00:00:00Z");
        assert_eq!(todo["s3uri_list"][1], "s3://bucket/file2");

        let restored: RunManifest = serde_json::from_value(value).unwrap();
        assert_eq!(restored, manifest);
    }

    #[test]
    fn test_artifact_count() {
        let manifest = RunManifest {
            todo_list: vec![
                TableTodo {
                    table: "accounts".to_string(),
                    start_after: "2021-01-01T00:00:00Z".parse().unwrap(),
                    end_until: "2021-01-02T00:00:00Z".parse().unwrap(),
                    s3uri_list: vec!["s3://b/1".to_string(), "s3://b/2".to_string()],
                },
                TableTodo {
                    table: "orders".to_string(),
                    start_after: "2021-01-01T00:00:00Z".parse().unwrap(),
                    end_until: "2021-01-02T00:00:00Z".parse().unwrap(),
                    s3uri_list: vec![],
                },
            ],
        };
        assert_eq!(manifest.artifact_count(), 2);
    }
}
