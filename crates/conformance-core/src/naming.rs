//! Unique resource-name generation.
//!
//! Parallel test runs never coordinate through a shared lock; collision
//! avoidance is pushed entirely into the generated names, which carry a
//! random salt plus a millisecond timestamp.

use rand::distributions::Alphanumeric;
use rand::Rng;

const SALT_LEN: usize = 8;

/// Random lowercase alphanumeric salt of the given length.
pub fn random_salt(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// `{prefix}_{salt}_{epoch_ms}`, unique across concurrent runs.
pub fn unique_resource_name(prefix: &str) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        random_salt(SALT_LEN),
        chrono::Utc::now().timestamp_millis()
    )
}
