//! Kafka adapter: provisions a broker container and drives records through it.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::kafka::{Kafka, KAFKA_PORT};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::naming;
use crate::records::RecordSet;
use crate::tester::{ExternalSystem, PlatformConsumer, SystemHandle};

const SYSTEM_NAME: &str = "kafka";
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Source-side Kafka instance managed through testcontainers.
///
/// The topic name is salted at construction time, so concurrent runs against
/// independent containers never collide.
pub struct KafkaSourceAdapter {
    container: Option<ContainerAsync<Kafka>>,
    topic: String,
}

impl KafkaSourceAdapter {
    pub fn new() -> Self {
        Self {
            container: None,
            topic: naming::unique_resource_name("kafka_source_topic"),
        }
    }

    fn producer(&self, handle: &SystemHandle) -> Result<FutureProducer> {
        ClientConfig::new()
            .set("bootstrap.servers", &handle.bootstrap)
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|e| Error::Delivery(format!("failed to create producer: {}", e)))
    }
}

impl Default for KafkaSourceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalSystem for KafkaSourceAdapter {
    fn name(&self) -> &str {
        SYSTEM_NAME
    }

    async fn provision(&mut self, cluster: &str) -> Result<SystemHandle> {
        if self.container.is_some() {
            return Err(Error::Provisioning(
                "kafka already provisioned for this run".to_string(),
            ));
        }

        let image = Kafka::default().with_env_var("KAFKA_AUTO_CREATE_TOPICS_ENABLE", "false");
        let container = image
            .start()
            .await
            .map_err(|e| Error::Provisioning(format!("failed to start kafka container: {}", e)))?;

        let host = container
            .get_host()
            .await
            .map_err(|e| Error::Provisioning(format!("failed to resolve kafka host: {}", e)))?;
        let port = container
            .get_host_port_ipv4(KAFKA_PORT)
            .await
            .map_err(|e| Error::Provisioning(format!("failed to resolve kafka port: {}", e)))?;
        let bootstrap = format!("{}:{}", host, port);

        info!(cluster, %bootstrap, "provisioned kafka");
        self.container = Some(container);

        Ok(SystemHandle {
            system: SYSTEM_NAME.to_string(),
            bootstrap,
            resource: self.topic.clone(),
        })
    }

    async fn prepare(&mut self, handle: &SystemHandle) -> Result<()> {
        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &handle.bootstrap)
            .create()
            .map_err(|e| Error::Setup(format!("failed to create admin client: {}", e)))?;

        let topic = NewTopic::new(&handle.resource, 1, TopicReplication::Fixed(1));
        let results = admin
            .create_topics(&[topic], &AdminOptions::new())
            .await
            .map_err(|e| Error::Setup(format!("topic creation request failed: {}", e)))?;

        for result in results {
            // the broker's raw error text is the diagnostic surface here
            result.map_err(|(name, err)| {
                Error::Setup(format!("failed to create topic {}: {}", name, err))
            })?;
        }

        debug!(topic = %handle.resource, "created kafka topic");
        Ok(())
    }

    async fn produce_records(
        &mut self,
        handle: &SystemHandle,
        count: usize,
    ) -> Result<RecordSet> {
        let producer = self.producer(handle)?;
        let expected = RecordSet::generate(count);

        for (key, value) in expected.iter() {
            // each send is acknowledged before the next so the topic is fully
            // flushed when verification starts
            producer
                .send(
                    FutureRecord::to(&handle.resource).key(key).payload(value),
                    SEND_TIMEOUT,
                )
                .await
                .map_err(|(e, _)| {
                    Error::Delivery(format!("record {} not acknowledged: {}", key, e))
                })?;
        }

        info!(count, topic = %handle.resource, "produced records");
        Ok(expected)
    }

    fn source_config(&self, handle: &SystemHandle) -> BTreeMap<String, String> {
        let mut config = BTreeMap::new();
        config.insert("bootstrapServers".to_string(), handle.bootstrap.clone());
        config.insert("groupId".to_string(), "test-source-group".to_string());
        config.insert("fetchMinBytes".to_string(), "1".to_string());
        config.insert("autoCommitIntervalMs".to_string(), "10".to_string());
        config.insert("sessionTimeoutMs".to_string(), "10000".to_string());
        config.insert("topic".to_string(), handle.resource.clone());
        config.insert(
            "valueDeserializationClass".to_string(),
            "org.apache.kafka.common.serialization.ByteArrayDeserializer".to_string(),
        );
        config
    }

    async fn teardown(&mut self) -> Result<()> {
        if let Some(container) = self.container.take() {
            container.stop().await.map_err(|e| {
                Error::Provisioning(format!("failed to stop kafka container: {}", e))
            })?;
            info!(topic = %self.topic, "tore down kafka");
        }
        Ok(())
    }
}

/// Consumes the Kafka topic directly instead of the platform side.
///
/// Stands in for the platform consumer when validating the adapter itself
/// rather than a deployed connector.
pub struct KafkaLoopbackConsumer;

#[async_trait]
impl PlatformConsumer for KafkaLoopbackConsumer {
    async fn consume(
        &mut self,
        handle: &SystemHandle,
        count: usize,
        timeout: Duration,
    ) -> Result<Vec<(String, String)>> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &handle.bootstrap)
            .set(
                "group.id",
                format!("conformance-{}", naming::random_salt(8)),
            )
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()
            .map_err(|e| Error::Setup(format!("failed to create consumer: {}", e)))?;

        consumer
            .subscribe(&[&handle.resource])
            .map_err(|e| Error::Setup(format!("failed to subscribe to {}: {}", handle.resource, e)))?;

        let mut observed = Vec::new();
        let deadline = tokio::time::Instant::now() + timeout;

        while observed.len() < count {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, consumer.recv()).await {
                Ok(Ok(message)) => {
                    let key = message
                        .key()
                        .map(|k| String::from_utf8_lossy(k).into_owned())
                        .unwrap_or_default();
                    let value = message
                        .payload()
                        .map(|v| String::from_utf8_lossy(v).into_owned())
                        .unwrap_or_default();
                    observed.push((key, value));
                }
                Ok(Err(e)) => {
                    return Err(Error::Delivery(format!("kafka consume error: {}", e)));
                }
                // timed out; verification will report whatever is missing
                Err(_) => break,
            }
        }

        debug!(observed = observed.len(), count, "loopback consume finished");
        Ok(observed)
    }
}
