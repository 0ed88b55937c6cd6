//! Phase state machine tests with scripted in-memory adapters.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conformance_core::{
    ConformanceTest, DuplicatePolicy, Error, ExternalSystem, HarnessConfig, Phase,
    PlatformConsumer, RecordSet, Result, SystemHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailAt {
    Nowhere,
    Provision,
    Prepare,
    Produce,
}

/// In-memory adapter that records every call and fails on cue.
struct ScriptedAdapter {
    fail_at: FailAt,
    calls: Arc<Mutex<Vec<&'static str>>>,
    produced: Arc<Mutex<Option<RecordSet>>>,
}

impl ScriptedAdapter {
    fn new(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            calls: Arc::new(Mutex::new(Vec::new())),
            produced: Arc::new(Mutex::new(None)),
        }
    }

    fn calls(&self) -> Arc<Mutex<Vec<&'static str>>> {
        Arc::clone(&self.calls)
    }

    fn produced(&self) -> Arc<Mutex<Option<RecordSet>>> {
        Arc::clone(&self.produced)
    }
}

#[async_trait]
impl ExternalSystem for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn provision(&mut self, cluster: &str) -> Result<SystemHandle> {
        self.calls.lock().unwrap().push("provision");
        if self.fail_at == FailAt::Provision {
            return Err(Error::Provisioning("container refused to start".to_string()));
        }
        Ok(SystemHandle {
            system: "scripted".to_string(),
            bootstrap: format!("{}:9092", cluster),
            resource: "scripted_topic_1".to_string(),
        })
    }

    async fn prepare(&mut self, _handle: &SystemHandle) -> Result<()> {
        self.calls.lock().unwrap().push("prepare");
        if self.fail_at == FailAt::Prepare {
            return Err(Error::Setup("topic already exists".to_string()));
        }
        Ok(())
    }

    async fn produce_records(
        &mut self,
        _handle: &SystemHandle,
        count: usize,
    ) -> Result<RecordSet> {
        self.calls.lock().unwrap().push("produce");
        if self.fail_at == FailAt::Produce {
            return Err(Error::Delivery("record key-0 not acknowledged".to_string()));
        }
        let records = RecordSet::generate(count);
        *self.produced.lock().unwrap() = Some(records.clone());
        Ok(records)
    }

    fn source_config(&self, _handle: &SystemHandle) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    async fn teardown(&mut self) -> Result<()> {
        self.calls.lock().unwrap().push("teardown");
        Ok(())
    }
}

/// Consumer that replays whatever the scripted adapter produced, minus
/// dropped keys, plus injected extras.
struct ReplayConsumer {
    produced: Arc<Mutex<Option<RecordSet>>>,
    drop_keys: Vec<&'static str>,
    extras: Vec<(String, String)>,
}

impl ReplayConsumer {
    fn faithful(adapter: &ScriptedAdapter) -> Self {
        Self {
            produced: adapter.produced(),
            drop_keys: Vec::new(),
            extras: Vec::new(),
        }
    }
}

#[async_trait]
impl PlatformConsumer for ReplayConsumer {
    async fn consume(
        &mut self,
        _handle: &SystemHandle,
        _count: usize,
        _timeout: Duration,
    ) -> Result<Vec<(String, String)>> {
        let produced = self.produced.lock().unwrap().clone().unwrap_or_default();
        let mut observed: Vec<_> = produced
            .to_vec()
            .into_iter()
            .filter(|(key, _)| !self.drop_keys.contains(&key.as_str()))
            .collect();
        observed.extend(self.extras.clone());
        Ok(observed)
    }
}

fn config(records: usize) -> HarnessConfig {
    HarnessConfig {
        record_count: records,
        verify_timeout_secs: 5,
        duplicates: DuplicatePolicy::Forbid,
    }
}

#[tokio::test]
async fn full_run_reaches_verified() {
    let adapter = ScriptedAdapter::new(FailAt::Nowhere);
    let calls = adapter.calls();
    let consumer = ReplayConsumer::faithful(&adapter);

    let mut test = ConformanceTest::new(adapter, consumer, config(10));
    let report = test.run("unit-cluster").await;

    assert!(report.passed(), "unexpected failure: {:?}", report.error);
    assert_eq!(report.final_phase, Phase::Verified);
    assert_eq!(test.phase(), Phase::Verified);
    assert_eq!(report.records_expected, 10);
    assert_eq!(report.records_observed, 10);
    assert!(report.error.is_none());
    assert!(report.teardown_error.is_none());
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["provision", "prepare", "produce", "teardown"]
    );
}

#[tokio::test]
async fn zero_records_verify_trivially() {
    let adapter = ScriptedAdapter::new(FailAt::Nowhere);
    let consumer = ReplayConsumer::faithful(&adapter);

    let mut test = ConformanceTest::new(adapter, consumer, config(0));
    let report = test.run("unit-cluster").await;

    assert!(report.passed());
    assert_eq!(report.records_expected, 0);
    assert_eq!(report.records_observed, 0);
}

#[tokio::test]
async fn provisioning_failure_skips_later_phases_but_tears_down() {
    let adapter = ScriptedAdapter::new(FailAt::Provision);
    let calls = adapter.calls();
    let consumer = ReplayConsumer::faithful(&adapter);

    let mut test = ConformanceTest::new(adapter, consumer, config(10));
    let report = test.run("unit-cluster").await;

    assert_eq!(report.final_phase, Phase::Failed);
    assert_eq!(test.phase(), Phase::Failed);
    assert!(report.error.as_deref().unwrap().contains("Provisioning"));
    // prepare, produce and verify never ran; teardown still did
    assert_eq!(*calls.lock().unwrap(), vec!["provision", "teardown"]);
}

#[tokio::test]
async fn prepare_failure_surfaces_raw_error_and_tears_down() {
    let adapter = ScriptedAdapter::new(FailAt::Prepare);
    let calls = adapter.calls();
    let consumer = ReplayConsumer::faithful(&adapter);

    let mut test = ConformanceTest::new(adapter, consumer, config(10));
    let report = test.run("unit-cluster").await;

    assert_eq!(report.final_phase, Phase::Failed);
    let error = report.error.unwrap();
    assert!(error.contains("Setup"));
    assert!(error.contains("topic already exists"));
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["provision", "prepare", "teardown"]
    );
}

#[tokio::test]
async fn unacknowledged_record_fails_the_run() {
    let adapter = ScriptedAdapter::new(FailAt::Produce);
    let calls = adapter.calls();
    let consumer = ReplayConsumer::faithful(&adapter);

    let mut test = ConformanceTest::new(adapter, consumer, config(10));
    let report = test.run("unit-cluster").await;

    assert_eq!(report.final_phase, Phase::Failed);
    assert!(report.error.as_deref().unwrap().contains("Delivery"));
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["provision", "prepare", "produce", "teardown"]
    );
}

#[tokio::test]
async fn lost_record_fails_verification() {
    let adapter = ScriptedAdapter::new(FailAt::Nowhere);
    let consumer = ReplayConsumer {
        produced: adapter.produced(),
        drop_keys: vec!["key-3"],
        extras: Vec::new(),
    };

    let mut test = ConformanceTest::new(adapter, consumer, config(10));
    let report = test.run("unit-cluster").await;

    assert_eq!(report.final_phase, Phase::Failed);
    assert_eq!(report.records_observed, 9);
    assert!(report.error.as_deref().unwrap().contains("1 missing"));
}

#[tokio::test]
async fn duplicate_delivery_honors_policy() {
    let duplicate = ("key-0".to_string(), "value-0".to_string());

    let adapter = ScriptedAdapter::new(FailAt::Nowhere);
    let consumer = ReplayConsumer {
        produced: adapter.produced(),
        drop_keys: Vec::new(),
        extras: vec![duplicate.clone()],
    };
    let mut test = ConformanceTest::new(adapter, consumer, config(5));
    let report = test.run("unit-cluster").await;
    assert_eq!(report.final_phase, Phase::Failed);
    assert!(report.error.as_deref().unwrap().contains("duplicated"));

    let adapter = ScriptedAdapter::new(FailAt::Nowhere);
    let consumer = ReplayConsumer {
        produced: adapter.produced(),
        drop_keys: Vec::new(),
        extras: vec![duplicate],
    };
    let tolerant = HarnessConfig {
        duplicates: DuplicatePolicy::Allow,
        ..config(5)
    };
    let mut test = ConformanceTest::new(adapter, consumer, tolerant);
    let report = test.run("unit-cluster").await;
    assert!(report.passed(), "unexpected failure: {:?}", report.error);
}

#[tokio::test]
async fn invalid_config_fails_before_provisioning() {
    let adapter = ScriptedAdapter::new(FailAt::Nowhere);
    let calls = adapter.calls();
    let consumer = ReplayConsumer::faithful(&adapter);

    let bad = HarnessConfig {
        verify_timeout_secs: 0,
        ..config(10)
    };
    let mut test = ConformanceTest::new(adapter, consumer, bad);
    let report = test.run("unit-cluster").await;

    assert_eq!(report.final_phase, Phase::Failed);
    assert!(report.error.as_deref().unwrap().contains("Configuration"));
    assert!(calls.lock().unwrap().is_empty());
}
