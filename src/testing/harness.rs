//! Per-scenario round-trip fixture.
//!
//! A [`RoundTripHarness`] owns everything one scenario needs: optionally an
//! embedded broker, and a [`ListenerContainer`] already assigned its
//! partitions. Each [`RoundTripHarness::round_trip`] call opens its own
//! producer, sends the message as key and value, closes the producer, and
//! waits for the record with an explicit deadline.

use crate::config::{ConsumerConfig, ProducerConfig, DEFAULT_GROUP_ID, DEFAULT_TOPIC};
use crate::consumer::ListenerContainer;
use crate::error::{Error, Result};
use crate::producer::{ProducerRecord, ProtobufProducer, RecordMetadata};
use crate::serde::{Deserializer, ProtobufDeserializer};
use crate::testing::embedded::{EmbeddedKafka, DEFAULT_PARTITIONS_PER_TOPIC};
use std::time::Duration;
use tokio::time::Instant;

/// Settings for one scenario.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub topic: String,
    pub group_id: String,
    /// Partitions per topic on the embedded broker
    pub partitions_per_topic: i32,
    /// Deadline for partition assignment, for each send, and for each receive
    pub timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            partitions_per_topic: DEFAULT_PARTITIONS_PER_TOPIC,
            timeout: Duration::from_secs(10),
        }
    }
}

/// The decoded key and value of a record that went through the broker.
#[derive(Debug, Clone)]
pub struct RoundTrip<M> {
    pub key: M,
    pub value: M,
    pub metadata: RecordMetadata,
}

/// Broker, listener, and producer settings for a round-trip scenario.
pub struct RoundTripHarness {
    // Field order matters: the container must go before the broker it talks to
    container: ListenerContainer,
    producer_config: ProducerConfig,
    timeout: Duration,
    broker: Option<EmbeddedKafka>,
}

impl RoundTripHarness {
    /// Start an embedded broker and a listener on `config.topic`.
    pub async fn start(config: HarnessConfig) -> Result<Self> {
        if config.partitions_per_topic < 1 {
            return Err(Error::InvalidConfig(format!(
                "partitions per topic must be at least 1, got {}",
                config.partitions_per_topic
            )));
        }

        let broker = EmbeddedKafka::start(config.partitions_per_topic, &[&config.topic])?;
        let brokers = broker.bootstrap_servers();

        let producer_config = ProducerConfig {
            brokers: brokers.clone(),
            ..Default::default()
        };
        let consumer_config = ConsumerConfig {
            brokers,
            group_id: config.group_id,
            topic: config.topic,
            ..Default::default()
        };

        Self::with_clients(
            producer_config,
            consumer_config,
            config.partitions_per_topic as usize,
            config.timeout,
            Some(broker),
        )
        .await
    }

    /// Use an already running broker.
    ///
    /// The topic must exist; the listener waits for at least one partition.
    pub async fn connect(
        producer_config: ProducerConfig,
        consumer_config: ConsumerConfig,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_clients(producer_config, consumer_config, 1, timeout, None).await
    }

    async fn with_clients(
        producer_config: ProducerConfig,
        consumer_config: ConsumerConfig,
        partitions: usize,
        timeout: Duration,
        broker: Option<EmbeddedKafka>,
    ) -> Result<Self> {
        let container = ListenerContainer::start(&consumer_config)?;
        let harness = Self {
            container,
            producer_config,
            timeout,
            broker,
        };
        harness
            .container
            .wait_for_assignment(partitions, timeout)
            .await?;
        Ok(harness)
    }

    /// Send `message` as key and value, then read both back and decode them.
    ///
    /// Records other than the one just sent are skipped until the deadline.
    /// The caller compares the result with `message`.
    pub async fn round_trip<M>(&self, message: &M) -> Result<RoundTrip<M>>
    where
        M: protobuf::Message,
    {
        let container = &self.container;
        let topic = container.topic();

        let producer = ProtobufProducer::<M, M>::protobuf(&self.producer_config)?;
        let sent = producer
            .send(ProducerRecord::to(topic).key(message).value(message))
            .await;
        // The producer is closed even when the send failed
        let closed = producer.close(self.timeout);
        let metadata = sent?;
        closed?;

        let deadline = Instant::now() + self.timeout;
        let record = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let record = container
                .recv_timeout(remaining)
                .await
                .map_err(|err| match err {
                    Error::Timeout(_) => Error::Timeout(self.timeout),
                    other => other,
                })?;
            if record.partition == metadata.partition && record.offset == metadata.offset {
                break record;
            }
            tracing::debug!(
                "Skipping record {}[{}]@{} while waiting for [{}]@{}",
                record.topic,
                record.partition,
                record.offset,
                metadata.partition,
                metadata.offset
            );
        };
        tracing::debug!(
            "Round trip of {} landed at {}[{}]@{}",
            M::NAME,
            record.topic,
            record.partition,
            record.offset
        );

        // Both slots were sent, so an absent one is a zero-length payload
        let deserializer = ProtobufDeserializer::<M>::new();
        let key = deserializer.deserialize(topic, record.key.as_deref().unwrap_or_default())?;
        let value = deserializer.deserialize(topic, record.value.as_deref().unwrap_or_default())?;

        Ok(RoundTrip {
            key,
            value,
            metadata,
        })
    }

    /// Bootstrap servers of the embedded broker, if this harness owns one.
    pub fn bootstrap_servers(&self) -> Option<String> {
        self.broker.as_ref().map(EmbeddedKafka::bootstrap_servers)
    }

    /// Stop the listener, then the broker.
    pub async fn shutdown(self) {
        let Self {
            container, broker, ..
        } = self;
        container.stop().await;
        drop(broker);
    }
}
