//! Source artifact types and key codec

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Partition path format: `YYYY/MM/DD/HH`
const PARTITION_DIR_FORMAT: &str = "%Y/%m/%d/%H";

/// Filename timestamp token format, millisecond encoded: `YYYYMMDD-HHMMSSmmm`
const FILENAME_TOKEN_FORMAT: &str = "%Y%m%d-%H%M%S%3f";

/// Filename prefix marking one-time full/initial load exports.
/// These belong to a separate ingestion path and never enter a window.
const FULL_LOAD_PREFIX: &str = "LOAD";

/// What kind of export an artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Incremental change-data file, timestamp-keyed
    Incremental,
    /// Full/initial load export, excluded from incremental planning
    FullLoad,
}

/// One file in the partitioned CDC stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArtifact {
    /// Object key relative to the store root
    pub key: String,
    /// Full URI handed to the batch job
    pub uri: String,
    /// Event time encoded in the key (meaningless for full loads)
    pub timestamp: DateTime<Utc>,
    /// Incremental or full load
    pub kind: ArtifactKind,
}

/// Encode a timestamp as a partitioned key suffix:
/// `YYYY/MM/DD/HH/YYYYMMDD-HHMMSSmmm`
///
/// Lexicographic ordering of these keys equals chronological ordering,
/// which is what makes "list after cursor" a window query.
pub fn timestamp_to_key(ts: DateTime<Utc>) -> String {
    format!(
        "{}/{}",
        ts.format(PARTITION_DIR_FORMAT),
        ts.format(FILENAME_TOKEN_FORMAT)
    )
}

/// Parse the millisecond timestamp token of an artifact filename
pub fn filename_to_timestamp(token: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(token, FILENAME_TOKEN_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::timestamp_parse(token, e.to_string()))
}

/// Whether a filename marks a full/initial load export
pub fn is_full_load_filename(filename: &str) -> bool {
    filename.starts_with(FULL_LOAD_PREFIX)
}

impl SourceArtifact {
    /// Parse an artifact from its object key and URI.
    ///
    /// The timestamp token is the final path segment with any extension
    /// stripped. Full-load files carry no token and are tagged instead of
    /// rejected, so listings stay complete.
    pub fn parse(key: impl Into<String>, uri: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let filename = key.rsplit('/').next().unwrap_or(&key);
        let token = filename.split('.').next().unwrap_or(filename);

        if is_full_load_filename(filename) {
            return Ok(Self {
                key,
                uri: uri.into(),
                timestamp: DateTime::<Utc>::MIN_UTC,
                kind: ArtifactKind::FullLoad,
            });
        }

        let timestamp = filename_to_timestamp(token).map_err(|e| Error::InvalidArtifactKey {
            key: key.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            key,
            uri: uri.into(),
            timestamp,
            kind: ArtifactKind::Incremental,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_to_key() {
        let ts = Utc
            .with_ymd_and_hms(2023, 1, 7, 8, 30, 15)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(123))
            .unwrap();
        assert_eq!(timestamp_to_key(ts), "2023/01/07/08/20230107-083015123");
    }

    #[test]
    fn test_filename_to_timestamp() {
        let ts = filename_to_timestamp("20230107-083015123").unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-01-07T08:30:15.123+00:00");

        assert!(filename_to_timestamp("not-a-timestamp").is_err());
    }

    #[test]
    fn test_key_codec_round_trip() {
        let ts = filename_to_timestamp("20231231-235959999").unwrap();
        let key = timestamp_to_key(ts);
        let token = key.rsplit('/').next().unwrap();
        assert_eq!(filename_to_timestamp(token).unwrap(), ts);
    }

    #[test]
    fn test_key_ordering_is_chronological() {
        let earlier = Utc.with_ymd_and_hms(2023, 1, 7, 8, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2023, 1, 7, 9, 0, 0).unwrap();
        assert!(timestamp_to_key(earlier) < timestamp_to_key(later));
    }

    #[test]
    fn test_parse_incremental_artifact() {
        let artifact = SourceArtifact::parse(
            "streams/accounts/2023/01/07/08/20230107-083015123.json",
            "s3://bucket/streams/accounts/2023/01/07/08/20230107-083015123.json",
        )
        .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Incremental);
        assert_eq!(
            artifact.timestamp,
            filename_to_timestamp("20230107-083015123").unwrap()
        );
    }

    #[test]
    fn test_parse_full_load_artifact() {
        let artifact = SourceArtifact::parse(
            "streams/accounts/LOAD00000001.parquet",
            "s3://bucket/streams/accounts/LOAD00000001.parquet",
        )
        .unwrap();
        assert_eq!(artifact.kind, ArtifactKind::FullLoad);
    }

    #[test]
    fn test_parse_garbage_key_fails() {
        let result = SourceArtifact::parse("streams/accounts/readme.txt", "s3://b/readme.txt");
        assert!(result.is_err());
    }
}
