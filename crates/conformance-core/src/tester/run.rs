//! Conformance run driver and report.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::HarnessConfig;
use crate::error::Error;

use super::{ExternalSystem, Phase, PlatformConsumer, SystemHandle};

/// Outcome of a single phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub ok: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final report of a conformance run.
#[derive(Debug, Clone, Serialize)]
pub struct ConformanceReport {
    /// External system under test
    pub system: String,
    /// Cluster identifier the run was bound to
    pub cluster: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Last phase reached; `Verified` on success, `Failed` otherwise
    pub final_phase: Phase,
    pub phases: Vec<PhaseOutcome>,
    pub records_expected: usize,
    pub records_observed: usize,
    /// First failure, if any; later phases were skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Teardown failure; reported separately so it never masks the primary error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
}

impl ConformanceReport {
    pub fn passed(&self) -> bool {
        self.final_phase == Phase::Verified
    }
}

/// Drives one conformance run: a single adapter bound to a single
/// platform-side consumer, stepped through the phase protocol.
///
/// Phases run strictly sequentially within one instance; independent
/// instances may run concurrently because every provisioned resource name is
/// salted, never shared.
pub struct ConformanceTest<S, C> {
    adapter: S,
    consumer: C,
    config: HarnessConfig,
    phase: Phase,
}

impl<S: ExternalSystem, C: PlatformConsumer> ConformanceTest<S, C> {
    pub fn new(adapter: S, consumer: C, config: HarnessConfig) -> Self {
        Self {
            adapter,
            consumer,
            config,
            phase: Phase::Unprovisioned,
        }
    }

    /// Current phase of the run.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run all phases against the given cluster.
    ///
    /// The first failure stops the state machine; teardown of the external
    /// system runs on every exit path.
    pub async fn run(&mut self, cluster: &str) -> ConformanceReport {
        let wall_start = Instant::now();
        let mut report = ConformanceReport {
            system: self.adapter.name().to_string(),
            cluster: cluster.to_string(),
            started_at: Utc::now(),
            duration_ms: 0,
            final_phase: self.phase,
            phases: Vec::new(),
            records_expected: self.config.record_count,
            records_observed: 0,
            error: None,
            teardown_error: None,
        };

        if let Err(err) = self.config.validate() {
            self.fail(&mut report, Phase::Unprovisioned, Instant::now(), err);
            report.duration_ms = wall_start.elapsed().as_millis() as u64;
            return report;
        }

        info!(system = %report.system, cluster, "starting conformance run");

        let phase_start = Instant::now();
        match self.adapter.provision(cluster).await {
            Ok(handle) => {
                self.advance(&mut report, Phase::Provisioned, phase_start);
                self.drive(&handle, &mut report).await;
            }
            Err(err) => {
                self.fail(&mut report, Phase::Provisioned, phase_start, err);
            }
        }

        // teardown runs on every exit path, provisioning failure included
        if let Err(err) = self.adapter.teardown().await {
            warn!(error = %err, "teardown failed, external system may leak");
            report.teardown_error = Some(err.to_string());
        }

        report.duration_ms = wall_start.elapsed().as_millis() as u64;
        report
    }

    async fn drive(&mut self, handle: &SystemHandle, report: &mut ConformanceReport) {
        let phase_start = Instant::now();
        if let Err(err) = self.adapter.prepare(handle).await {
            self.fail(report, Phase::Prepared, phase_start, err);
            return;
        }
        self.advance(report, Phase::Prepared, phase_start);

        let phase_start = Instant::now();
        let expected = match self
            .adapter
            .produce_records(handle, self.config.record_count)
            .await
        {
            Ok(records) => {
                self.advance(report, Phase::Produced, phase_start);
                records
            }
            Err(err) => {
                self.fail(report, Phase::Produced, phase_start, err);
                return;
            }
        };
        report.records_expected = expected.len();

        let phase_start = Instant::now();
        let timeout = Duration::from_secs(self.config.verify_timeout_secs);
        let observed = match self
            .consumer
            .consume(handle, expected.len(), timeout)
            .await
        {
            Ok(observed) => observed,
            Err(err) => {
                self.fail(report, Phase::Verified, phase_start, err);
                return;
            }
        };
        report.records_observed = observed.len();

        match expected.verify_against(&observed, self.config.duplicates) {
            Ok(()) => self.advance(report, Phase::Verified, phase_start),
            Err(failure) => {
                self.fail(report, Phase::Verified, phase_start, Error::Verification(failure));
            }
        }
    }

    fn advance(&mut self, report: &mut ConformanceReport, phase: Phase, start: Instant) {
        self.phase = phase;
        report.final_phase = phase;
        report.phases.push(PhaseOutcome {
            phase,
            ok: true,
            duration_ms: start.elapsed().as_millis() as u64,
            error: None,
        });
        info!(?phase, "phase complete");
    }

    fn fail(&mut self, report: &mut ConformanceReport, phase: Phase, start: Instant, err: Error) {
        error!(?phase, error = %err, "phase failed");
        report.phases.push(PhaseOutcome {
            phase,
            ok: false,
            duration_ms: start.elapsed().as_millis() as u64,
            error: Some(err.to_string()),
        });
        report.error = Some(err.to_string());
        self.phase = Phase::Failed;
        report.final_phase = Phase::Failed;
    }
}
