//! Error types for the CDC orchestrator
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the CDC orchestrator
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Tracker state corrupted: {message}")]
    StateCorruption { message: String },

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Source listing failed: {message}")]
    Source { message: String },

    #[error("Invalid artifact key '{key}': {message}")]
    InvalidArtifactKey { key: String, message: String },

    #[error("Failed to parse timestamp '{value}': {message}")]
    TimestampParse { value: String, message: String },

    // ============================================================================
    // Manifest Errors
    // ============================================================================
    #[error("Manifest error: {message}")]
    Manifest { message: String },

    // ============================================================================
    // Job Runner Errors
    // ============================================================================
    #[error("Job run concurrency limit exceeded for job '{job_name}'")]
    ConcurrencyLimitExceeded { job_name: String },

    #[error("Failed to start job '{job_name}': {message}")]
    JobStart { job_name: String, message: String },

    #[error("Failed to poll run '{run_id}' of job '{job_name}': {message}")]
    JobPoll {
        job_name: String,
        run_id: String,
        message: String,
    },

    #[error("Unknown run state '{state}' reported for run '{run_id}'")]
    UnknownRunState { run_id: String, state: String },

    // ============================================================================
    // Transport / Storage Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a state corruption error
    pub fn state_corruption(message: impl Into<String>) -> Self {
        Self::StateCorruption {
            message: message.into(),
        }
    }

    /// Create a source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a manifest error
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }

    /// Create a concurrency limit error
    pub fn concurrency_limit(job_name: impl Into<String>) -> Self {
        Self::ConcurrencyLimitExceeded {
            job_name: job_name.into(),
        }
    }

    /// Create a job start error
    pub fn job_start(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JobStart {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a job poll error
    pub fn job_poll(
        job_name: impl Into<String>,
        run_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::JobPoll {
            job_name: job_name.into(),
            run_id: run_id.into(),
            message: message.into(),
        }
    }

    /// Create a timestamp parse error
    pub fn timestamp_parse(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TimestampParse {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Whether this error is the expected start-time concurrency conflict.
    ///
    /// The tracker swallows exactly this error and retries on the next tick;
    /// every other failure propagates to the caller.
    pub fn is_concurrency_limit(&self) -> bool {
        matches!(self, Error::ConcurrencyLimitExceeded { .. })
    }
}

/// Result type alias for the CDC orchestrator
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::concurrency_limit("incremental-load");
        assert_eq!(
            err.to_string(),
            "Job run concurrency limit exceeded for job 'incremental-load'"
        );

        let err = Error::job_poll("incremental-load", "run-42", "boom");
        assert_eq!(
            err.to_string(),
            "Failed to poll run 'run-42' of job 'incremental-load': boom"
        );
    }

    #[test]
    fn test_is_concurrency_limit() {
        assert!(Error::concurrency_limit("job").is_concurrency_limit());

        assert!(!Error::job_start("job", "denied").is_concurrency_limit());
        assert!(!Error::state("bad").is_concurrency_limit());
        assert!(!Error::http_status(429, "slow down").is_concurrency_limit());
    }
}
