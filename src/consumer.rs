//! Background record listener.
//!
//! [`ListenerContainer`] owns a subscribed rdkafka [`StreamConsumer`] and a
//! tokio task that forwards every record into a bounded channel. Receivers
//! wait with an explicit deadline, and a cancelled wait is reported as
//! [`Error::Cancelled`] rather than as an empty success.

use crate::config::ConsumerConfig;
use crate::error::{Error, Result};
use crate::serde::Deserializer;
use rdkafka::consumer::{Consumer as _, StreamConsumer};
use rdkafka::message::Message as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How often `wait_for_assignment` re-reads the consumer's assignment.
const ASSIGNMENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A record read from Kafka, with key and value still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedRecord {
    /// Kafka topic
    pub topic: String,
    /// Kafka partition
    pub partition: i32,
    /// Kafka offset
    pub offset: i64,
    /// Message key (if any)
    pub key: Option<Vec<u8>>,
    /// Message value (if any)
    pub value: Option<Vec<u8>>,
    /// Message timestamp (milliseconds since epoch)
    pub timestamp: Option<i64>,
}

impl ConsumedRecord {
    /// Decode the key, `None` if the record carried no key.
    pub fn decode_key<T, D: Deserializer<T>>(&self, deserializer: &D) -> Result<Option<T>> {
        self.key
            .as_deref()
            .map(|key| deserializer.deserialize(&self.topic, key))
            .transpose()
    }

    /// Decode the value, `None` if the record was a tombstone.
    pub fn decode_value<T, D: Deserializer<T>>(&self, deserializer: &D) -> Result<Option<T>> {
        self.value
            .as_deref()
            .map(|value| deserializer.deserialize(&self.topic, value))
            .transpose()
    }
}

/// Kafka consumer running in its own task, draining a topic into a channel
pub struct ListenerContainer {
    consumer: Arc<StreamConsumer>,
    records: Mutex<mpsc::Receiver<ConsumedRecord>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    topic: String,
}

impl ListenerContainer {
    /// Subscribe to the configured topic and start the listener task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &ConsumerConfig) -> Result<Self> {
        if config.channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }

        let consumer: StreamConsumer = config.client_config().create()?;
        consumer.subscribe(&[&config.topic])?;
        let consumer = Arc::new(consumer);

        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listen(Arc::clone(&consumer), tx, cancel.clone()));

        tracing::info!(
            "Listener started on topic '{}' (group '{}')",
            config.topic,
            config.group_id
        );

        Ok(Self {
            consumer,
            records: Mutex::new(rx),
            cancel,
            handle: Some(handle),
            topic: config.topic.clone(),
        })
    }

    /// Wait until the consumer group has assigned `partitions` partitions to this consumer.
    pub async fn wait_for_assignment(&self, partitions: usize, timeout: Duration) -> Result<()> {
        let wait = async {
            loop {
                let assigned = self.consumer.assignment()?.count();
                if assigned >= partitions {
                    tracing::debug!("Assigned {} partition(s) of '{}'", assigned, self.topic);
                    return Ok::<(), Error>(());
                }
                tokio::time::sleep(ASSIGNMENT_POLL_INTERVAL).await;
            }
        };

        tokio::select! {
            result = tokio::time::timeout(timeout, wait) => {
                result.map_err(|_| Error::Timeout(timeout))?
            }
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Wait for the next record, at most `deadline`.
    ///
    /// Returns [`Error::Timeout`] if nothing arrives in time and
    /// [`Error::Cancelled`] if the container is cancelled first.
    pub async fn recv_timeout(&self, deadline: Duration) -> Result<ConsumedRecord> {
        let mut records = self.records.lock().await;

        tokio::select! {
            // Prefer records already buffered over a concurrent cancellation
            biased;
            received = tokio::time::timeout(deadline, records.recv()) => match received {
                Ok(Some(record)) => Ok(record),
                Ok(None) => Err(Error::Cancelled),
                Err(_) => Err(Error::Timeout(deadline)),
            },
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Token that cancels the listener and every pending wait.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &StreamConsumer {
        &self.consumer
    }

    /// Cancel the listener task and wait for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Listener task for '{}' ended abnormally: {}", self.topic, e);
            }
        }
        self.consumer.unsubscribe();
        tracing::info!("Listener stopped on topic '{}'", self.topic);
    }
}

impl Drop for ListenerContainer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn listen(
    consumer: Arc<StreamConsumer>,
    tx: mpsc::Sender<ConsumedRecord>,
    cancel: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            received = consumer.recv() => received.map(|msg| ConsumedRecord {
                topic: msg.topic().to_string(),
                partition: msg.partition(),
                offset: msg.offset(),
                key: msg.key().map(|k| k.to_vec()),
                value: msg.payload().map(|p| p.to_vec()),
                timestamp: msg.timestamp().to_millis(),
            }),
            _ = cancel.cancelled() => break,
        };

        match received {
            Ok(record) => {
                tracing::debug!(
                    "Received record from {}[{}] at offset {}",
                    record.topic,
                    record.partition,
                    record.offset
                );
                tokio::select! {
                    sent = tx.send(record) => {
                        if sent.is_err() {
                            // Every receiver is gone
                            break;
                        }
                    }
                    _ = cancel.cancelled() => break,
                }
            }
            Err(e) => tracing::warn!("Error receiving message: {}", e),
        }
    }
}
