//! Error types for the conformance harness
//!
//! Every error maps onto one of four failure classes. The class decides how
//! far a failure reaches: the whole run, the current scenario, or nothing
//! at all because the harness never started.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance harness
#[derive(Error, Debug)]
pub enum Error {
    // === Connectivity ===
    #[error("Cannot reach backend at {url}: {message}. Is the server running?")]
    ConnectionFailure { url: String, message: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // === Assertions ===
    #[error("Expected status {expected}, got {actual}")]
    StatusMismatch { expected: String, actual: u16 },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Context variable '{0}' is not set; no earlier step captured it")]
    UnresolvedVariable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // === Invocation ===
    #[error("Usage error: {0}")]
    Usage(String),

    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How far a failure propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Backend unreachable; the run stops
    Connection,
    /// Expectation mismatch; the scenario stops
    Assertion,
    /// Unparsable body; handled like an assertion
    Malformed,
    /// Bad invocation; nothing runs
    Usage,
}

impl FailureClass {
    /// Whether a failure of this class ends the entire run
    pub fn aborts_run(self) -> bool {
        matches!(self, Self::Connection | Self::Usage)
    }
}

impl Error {
    /// Create a connection failure for the given URL
    pub fn connection(url: &str, message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Create a status mismatch from the expected set
    pub fn status_mismatch(expected: &[u16], actual: u16) -> Self {
        let expected = expected
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("|");
        Self::StatusMismatch { expected, actual }
    }

    /// Classify this error
    pub fn class(&self) -> FailureClass {
        match self {
            Error::ConnectionFailure { .. } => FailureClass::Connection,
            Error::MalformedResponse(_) => FailureClass::Malformed,
            Error::Timeout(_)
            | Error::StatusMismatch { .. }
            | Error::Assertion(_)
            | Error::UnresolvedVariable(_) => FailureClass::Assertion,
            Error::Usage(_)
            | Error::Config(_)
            | Error::ConfigParse(_)
            | Error::Io(_)
            | Error::FileRead { .. }
            | Error::Json(_)
            | Error::Yaml(_) => FailureClass::Usage,
        }
    }
}
