//! Error types for the conformance harness.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for conformance runs.
///
/// Phase failures are not retried: the first error stops the state machine,
/// while teardown of the external system runs unconditionally.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// External system failed to start or become reachable
    #[error("Provisioning error: {0}")]
    Provisioning(String),

    /// Resource creation on the external system was rejected
    #[error("Setup error: {0}")]
    Setup(String),

    /// A produced record was not acknowledged by the external system
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Observed record set does not match what was produced
    #[error("Verification failure: {0}")]
    Verification(#[from] VerificationFailure),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mismatch between the produced ground truth and the observed records.
///
/// This is the test's primary failure signal, distinct from harness faults:
/// the run itself worked, but the connector lost, altered, or duplicated data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "expected {expected_total} records, observed {observed_total}: \
     {} missing, {} mismatched, {} duplicated, {} unexpected",
    .missing.len(),
    .mismatched.len(),
    .duplicates.len(),
    .unexpected.len()
)]
pub struct VerificationFailure {
    /// Number of records produced during the produce phase
    pub expected_total: usize,
    /// Number of records the platform side surfaced
    pub observed_total: usize,
    /// Expected keys never observed
    pub missing: Vec<String>,
    /// Keys observed with a value different from the one produced
    pub mismatched: Vec<String>,
    /// Expected keys observed more than once (under the forbid policy)
    pub duplicates: Vec<String>,
    /// Observed keys that were never produced
    pub unexpected: Vec<String>,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
