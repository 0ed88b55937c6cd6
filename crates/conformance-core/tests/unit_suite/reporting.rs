//! Report serialization checks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conformance_core::{
    ConformanceTest, ExternalSystem, HarnessConfig, PlatformConsumer, RecordSet, Result,
    SystemHandle,
};

struct NoopAdapter {
    produced: Arc<Mutex<Option<RecordSet>>>,
}

#[async_trait]
impl ExternalSystem for NoopAdapter {
    fn name(&self) -> &str {
        "noop"
    }

    async fn provision(&mut self, cluster: &str) -> Result<SystemHandle> {
        Ok(SystemHandle {
            system: "noop".to_string(),
            bootstrap: format!("{}:9092", cluster),
            resource: "noop_topic".to_string(),
        })
    }

    async fn prepare(&mut self, _handle: &SystemHandle) -> Result<()> {
        Ok(())
    }

    async fn produce_records(
        &mut self,
        _handle: &SystemHandle,
        count: usize,
    ) -> Result<RecordSet> {
        let records = RecordSet::generate(count);
        *self.produced.lock().unwrap() = Some(records.clone());
        Ok(records)
    }

    fn source_config(&self, _handle: &SystemHandle) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    async fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}

struct Replay(Arc<Mutex<Option<RecordSet>>>);

#[async_trait]
impl PlatformConsumer for Replay {
    async fn consume(
        &mut self,
        _handle: &SystemHandle,
        _count: usize,
        _timeout: Duration,
    ) -> Result<Vec<(String, String)>> {
        Ok(self.0.lock().unwrap().clone().unwrap_or_default().to_vec())
    }
}

#[tokio::test]
async fn report_serializes_to_json() {
    let produced = Arc::new(Mutex::new(None));
    let adapter = NoopAdapter {
        produced: Arc::clone(&produced),
    };
    let mut test = ConformanceTest::new(adapter, Replay(produced), HarnessConfig::default());
    let report = test.run("json-cluster").await;
    assert!(report.passed());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["system"], "noop");
    assert_eq!(json["cluster"], "json-cluster");
    assert_eq!(json["final_phase"], "verified");
    assert_eq!(json["records_expected"], 10);
    // success reports omit the error fields entirely
    assert!(json.get("error").is_none());
    assert!(json.get("teardown_error").is_none());

    let phases: Vec<String> = json["phases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|outcome| outcome["phase"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(phases, vec!["provisioned", "prepared", "produced", "verified"]);
}
