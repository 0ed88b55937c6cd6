//! Phase protocol for connector conformance runs.
//!
//! Every connector test follows the same contract regardless of which
//! external system or connector implementation is under test: provision the
//! external system, prepare its resources, produce a known record set, then
//! verify the platform side observed it in full.

mod run;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::records::RecordSet;

pub use run::{ConformanceReport, ConformanceTest, PhaseOutcome};

/// Opaque reference to a provisioned external system instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemHandle {
    /// Adapter that provisioned the instance
    pub system: String,

    /// Connection coordinates (bootstrap address)
    pub bootstrap: String,

    /// Uniquely named resource (topic, table) allocated for this run
    pub resource: String,
}

/// Conformance run phases.
///
/// Strictly sequential with no backward transitions; any phase failure moves
/// the run to the terminal `Failed` state and skips the remaining phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Unprovisioned,
    Provisioned,
    Prepared,
    Produced,
    Verified,
    Failed,
}

/// Lifecycle controller for one externally-managed system-under-test.
///
/// Each external system (message queue, key-value store, ...) provides its
/// own implementation against its own client library.
#[async_trait]
pub trait ExternalSystem: Send {
    /// Short system identifier used in resource names and logs.
    fn name(&self) -> &str;

    /// Allocate and start the external system, returning a handle for the
    /// later phases. Called at most once per run; failure is fatal and is
    /// surfaced, never silently retried.
    async fn provision(&mut self, cluster: &str) -> Result<SystemHandle>;

    /// System-specific setup, e.g. creating the uniquely named topic or
    /// table the connector will read from.
    async fn prepare(&mut self, handle: &SystemHandle) -> Result<()>;

    /// Emit `count` deterministic records into the external system. Each
    /// send must be acknowledged before the next is issued so the system is
    /// fully flushed before verification starts.
    async fn produce_records(&mut self, handle: &SystemHandle, count: usize)
        -> Result<RecordSet>;

    /// Connector configuration pointing the platform's source connector at
    /// this instance.
    fn source_config(&self, handle: &SystemHandle) -> BTreeMap<String, String>;

    /// Release whatever was provisioned, if anything. Invoked on every exit
    /// path, including after a provisioning failure, and must be a no-op when
    /// nothing was started.
    async fn teardown(&mut self) -> Result<()>;
}

/// Platform-side observation seam.
///
/// Consumes whatever the connector under test moved into the messaging
/// platform, so the driver can compare it against the produced ground truth.
#[async_trait]
pub trait PlatformConsumer: Send {
    /// Collect up to `count` records, giving up after `timeout`. Returning
    /// fewer records is not an error here; the verification step reports the
    /// loss.
    async fn consume(
        &mut self,
        handle: &SystemHandle,
        count: usize,
        timeout: Duration,
    ) -> Result<Vec<(String, String)>>;
}
