use anyhow::Result;
use conformance_core::adapters::{KafkaLoopbackConsumer, KafkaSourceAdapter};
use conformance_core::{ConformanceReport, ConformanceTest, DuplicatePolicy, HarnessConfig};
use tracing::info;

/// Run command output format
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

pub async fn kafka_source(
    records: usize,
    cluster: &str,
    timeout: u64,
    allow_duplicates: bool,
    format: OutputFormat,
) -> Result<()> {
    let config = HarnessConfig {
        record_count: records,
        verify_timeout_secs: timeout,
        duplicates: if allow_duplicates {
            DuplicatePolicy::Allow
        } else {
            DuplicatePolicy::Forbid
        },
    };

    info!(records, cluster, "running kafka source conformance test");
    let mut test = ConformanceTest::new(KafkaSourceAdapter::new(), KafkaLoopbackConsumer, config);
    let report = test.run(cluster).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report_text(&report),
    }

    if !report.passed() {
        anyhow::bail!(
            "conformance run failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_report_text(report: &ConformanceReport) {
    println!("Conformance report");
    println!("  System:   {}", report.system);
    println!("  Cluster:  {}", report.cluster);
    println!("  Result:   {}", if report.passed() { "PASSED" } else { "FAILED" });
    println!(
        "  Records:  {} expected, {} observed",
        report.records_expected, report.records_observed
    );
    println!("  Duration: {} ms", report.duration_ms);
    println!("  Phases:");
    for outcome in &report.phases {
        match &outcome.error {
            Some(error) => println!(
                "    {:?}: failed after {} ms: {}",
                outcome.phase, outcome.duration_ms, error
            ),
            None => println!("    {:?}: ok ({} ms)", outcome.phase, outcome.duration_ms),
        }
    }
    if let Some(error) = &report.teardown_error {
        println!("  Teardown: {}", error);
    }
}
