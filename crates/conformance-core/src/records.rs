//! Record sets: the ground truth produced into the external system and the
//! comparison against what the platform side observed.

use indexmap::IndexMap;

use crate::config::DuplicatePolicy;
use crate::error::VerificationFailure;

/// Ordered key → value record set.
///
/// Produced once during the produce phase and compared, never mutated,
/// during verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    entries: IndexMap<String, String>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic synthetic records: `key-i` → `value-i` for `i in 0..count`.
    pub fn generate(count: usize) -> Self {
        let entries = (0..count)
            .map(|i| (format!("key-{}", i), format!("value-{}", i)))
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned `(key, value)` pairs in production order.
    pub fn to_vec(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Order-insensitive comparison against an observed delivery stream.
    ///
    /// Every expected pair must have been observed with its produced value.
    /// Repeat observations fail under `Forbid` and are collapsed under
    /// `Allow`; observations that were never produced always fail.
    pub fn verify_against(
        &self,
        observed: &[(String, String)],
        policy: DuplicatePolicy,
    ) -> std::result::Result<(), VerificationFailure> {
        let mut counts: IndexMap<&str, usize> =
            self.entries.keys().map(|k| (k.as_str(), 0)).collect();
        let mut mismatched = Vec::new();
        let mut unexpected = Vec::new();

        for (key, value) in observed {
            match self.entries.get(key) {
                Some(expected) if expected == value => {
                    if let Some(count) = counts.get_mut(key.as_str()) {
                        *count += 1;
                    }
                }
                Some(_) => mismatched.push(key.clone()),
                None => unexpected.push(key.clone()),
            }
        }

        let missing: Vec<String> = counts
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(key, _)| key.to_string())
            .collect();
        let duplicates: Vec<String> = match policy {
            DuplicatePolicy::Forbid => counts
                .iter()
                .filter(|(_, &count)| count > 1)
                .map(|(key, _)| key.to_string())
                .collect(),
            DuplicatePolicy::Allow => Vec::new(),
        };

        mismatched.sort();
        mismatched.dedup();
        unexpected.sort();
        unexpected.dedup();

        if missing.is_empty() && mismatched.is_empty() && duplicates.is_empty() && unexpected.is_empty()
        {
            Ok(())
        } else {
            Err(VerificationFailure {
                expected_total: self.entries.len(),
                observed_total: observed.len(),
                missing,
                mismatched,
                duplicates,
                unexpected,
            })
        }
    }
}

impl FromIterator<(String, String)> for RecordSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
