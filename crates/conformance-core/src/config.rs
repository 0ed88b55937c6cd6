//! Harness configuration: admin endpoint override and run policy.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Optional administrative endpoint override.
///
/// When no override is set, generated commands target the default local
/// admin endpoint and no `--admin-url` token is emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEndpoint {
    /// Worker host serving the admin API
    #[serde(default)]
    pub host: Option<String>,

    /// Admin API port
    #[serde(default)]
    pub port: Option<u16>,
}

impl AdminEndpoint {
    /// Endpoint targeting an explicit worker host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
        }
    }

    /// Full admin URL, present only when both host and port are set.
    pub fn url(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("http://{}:{}", host, port)),
            _ => None,
        }
    }
}

/// How duplicate deliveries of an expected record are treated during verify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Any duplicate observation fails verification
    #[default]
    Forbid,
    /// Duplicate observations of an expected record are collapsed
    Allow,
}

/// Per-run harness options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Number of records produced into the external system
    #[serde(default = "default_record_count")]
    pub record_count: usize,

    /// Maximum time to wait for the platform side to surface the records
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,

    /// Duplicate delivery tolerance
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            record_count: default_record_count(),
            verify_timeout_secs: default_verify_timeout_secs(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

fn default_record_count() -> usize {
    10
}

fn default_verify_timeout_secs() -> u64 {
    30
}

impl HarnessConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.verify_timeout_secs == 0 {
            return Err(Error::Config(
                "verify_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
