//! Typed Kafka producer.
//!
//! Wraps an rdkafka [`FutureProducer`] and runs every key and value through a
//! [`Serializer`] before handing the bytes to the client.

use crate::config::ProducerConfig;
use crate::error::{Error, Result};
use crate::serde::{ProtobufSerializer, Serializer};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer as _};
use std::marker::PhantomData;
use std::time::Duration;

/// A record about to be sent: destination plus borrowed key and value.
#[derive(Debug)]
pub struct ProducerRecord<'a, K, V> {
    pub topic: &'a str,
    pub partition: Option<i32>,
    pub key: Option<&'a K>,
    pub value: Option<&'a V>,
}

impl<'a, K, V> ProducerRecord<'a, K, V> {
    pub fn to(topic: &'a str) -> Self {
        Self {
            topic,
            partition: None,
            key: None,
            value: None,
        }
    }

    pub fn partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn key(mut self, key: &'a K) -> Self {
        self.key = Some(key);
        self
    }

    pub fn value(mut self, value: &'a V) -> Self {
        self.value = Some(value);
        self
    }
}

/// Where an acknowledged record landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Producer for records whose key and value are both protobuf messages.
pub type ProtobufProducer<K, V> = Producer<K, V, ProtobufSerializer<K>, ProtobufSerializer<V>>;

/// Kafka producer with pluggable key and value serializers
pub struct Producer<K, V, KS, VS> {
    producer: FutureProducer,
    key_serializer: KS,
    value_serializer: VS,
    queue_timeout: Duration,
    _records: PhantomData<fn(&K, &V)>,
}

impl<K, V> ProtobufProducer<K, V>
where
    K: protobuf::Message,
    V: protobuf::Message,
{
    /// Create a producer that encodes keys and values as protobuf.
    pub fn protobuf(config: &ProducerConfig) -> Result<Self> {
        Self::new(config, ProtobufSerializer::new(), ProtobufSerializer::new())
    }
}

impl<K, V, KS, VS> Producer<K, V, KS, VS>
where
    KS: Serializer<K>,
    VS: Serializer<V>,
{
    /// Create a new producer, configuring both serializers with the client properties.
    pub fn new(
        config: &ProducerConfig,
        mut key_serializer: KS,
        mut value_serializer: VS,
    ) -> Result<Self> {
        let properties = config.properties();
        let producer: FutureProducer = config.client_config().create()?;

        key_serializer.configure(&properties, true);
        value_serializer.configure(&properties, false);

        Ok(Self {
            producer,
            key_serializer,
            value_serializer,
            queue_timeout: config.queue_timeout,
            _records: PhantomData,
        })
    }

    /// Serialize and send a record, waiting for the broker acknowledgement.
    ///
    /// Serialization failures are returned before anything reaches the client.
    pub async fn send(&self, record: ProducerRecord<'_, K, V>) -> Result<RecordMetadata> {
        let key = record
            .key
            .map(|key| self.key_serializer.serialize(record.topic, key))
            .transpose()?;
        let payload = record
            .value
            .map(|value| self.value_serializer.serialize(record.topic, value))
            .transpose()?;

        let mut future_record = FutureRecord::<[u8], [u8]>::to(record.topic);
        if let Some(partition) = record.partition {
            future_record = future_record.partition(partition);
        }
        if let Some(key) = key.as_deref() {
            future_record = future_record.key(key);
        }
        if let Some(payload) = payload.as_deref() {
            future_record = future_record.payload(payload);
        }

        let (partition, offset) = self
            .producer
            .send(future_record, self.queue_timeout)
            .await
            .map_err(|(err, _)| Error::Transport(err))?;

        tracing::debug!(
            "Sent record to {}[{}] at offset {}",
            record.topic,
            partition,
            offset
        );

        Ok(RecordMetadata {
            topic: record.topic.to_string(),
            partition,
            offset,
        })
    }

    /// Flush outstanding records and close both serializers.
    pub fn close(mut self, timeout: Duration) -> Result<()> {
        let flushed = self.producer.flush(timeout);
        self.key_serializer.close();
        self.value_serializer.close();
        flushed.map_err(|err| match err {
            rdkafka::error::KafkaError::Flush(_) => Error::Timeout(timeout),
            other => Error::Kafka(other),
        })
    }

    /// Get the underlying producer (for advanced use cases)
    pub fn inner(&self) -> &FutureProducer {
        &self.producer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Operation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use test_messages::{samples, Proto2Message, Proto3Message};

    #[derive(Default, Clone)]
    struct Recording {
        configured: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    impl Serializer<Proto3Message> for Recording {
        fn configure(&mut self, properties: &crate::config::Properties, _is_key: bool) {
            assert!(properties.contains_key("bootstrap.servers"));
            self.configured.fetch_add(1, Ordering::SeqCst);
        }

        fn serialize(&self, topic: &str, data: &Proto3Message) -> Result<Vec<u8>> {
            ProtobufSerializer::<Proto3Message>::new().serialize(topic, data)
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_record_builder() {
        let message = samples::goodbye_world();
        let record = ProducerRecord::<Proto3Message, Proto3Message>::to("topic")
            .partition(1)
            .key(&message)
            .value(&message);
        assert_eq!(record.topic, "topic");
        assert_eq!(record.partition, Some(1));
        assert!(record.key.is_some());
        assert!(record.value.is_some());
    }

    #[tokio::test]
    async fn test_serializers_configured_and_closed() {
        let recording = Recording::default();
        let producer = Producer::<Proto3Message, Proto3Message, _, _>::new(
            &ProducerConfig::default(),
            recording.clone(),
            recording.clone(),
        )
        .unwrap();
        assert_eq!(recording.configured.load(Ordering::SeqCst), 2);

        producer.close(Duration::from_millis(100)).unwrap();
        assert_eq!(recording.closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_message_fails_before_sending() {
        // No broker is listening; the encode error must surface first
        let producer = ProtobufProducer::<Proto2Message, Proto2Message>::protobuf(
            &ProducerConfig::default(),
        )
        .unwrap();
        let invalid = Proto2Message::new();

        let err = producer
            .send(ProducerRecord::to("topic").key(&invalid).value(&invalid))
            .await
            .unwrap_err();
        match err {
            Error::Format(format) => assert_eq!(format.operation, Operation::Encode),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_is_transport_error() {
        let producer = ProtobufProducer::<Proto3Message, Proto3Message>::protobuf(
            &ProducerConfig {
                brokers: "127.0.0.1:1".to_string(),
                message_timeout_ms: "300".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let message = samples::goodbye_world();

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            producer.send(ProducerRecord::to("topic").key(&message).value(&message)),
        )
        .await
        .expect("delivery report should arrive after the message timeout")
        .unwrap_err();
        assert!(
            matches!(
                err,
                Error::Transport(rdkafka::error::KafkaError::MessageProduction(_))
            ),
            "expected transport error, got {err:?}"
        );
    }
}
