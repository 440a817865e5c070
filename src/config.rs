//! Kafka client configuration.
//!
//! [`ProducerConfig`] and [`ConsumerConfig`] are plain structs with defaults
//! suited to a local broker. [`KafkaOpts`] is the command-line / environment
//! surface that fills both.

pub mod duration;

use clap::Args;
use rdkafka::ClientConfig;
use std::collections::BTreeMap;
use std::time::Duration;

pub use duration::parse_duration;

/// librdkafka properties, as handed to `Serializer::configure`.
pub type Properties = BTreeMap<String, String>;

pub const DEFAULT_BROKERS: &str = "localhost:9092";
pub const DEFAULT_TOPIC: &str = "topic";
pub const DEFAULT_GROUP_ID: &str = "test.serializer";

/// Configuration for the typed producer
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Local delivery timeout in milliseconds
    pub message_timeout_ms: String,
    /// How long `send` may wait for room in the local producer queue
    pub queue_timeout: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            brokers: DEFAULT_BROKERS.to_string(),
            message_timeout_ms: "5000".to_string(),
            queue_timeout: Duration::from_secs(5),
        }
    }
}

impl ProducerConfig {
    pub fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("bootstrap.servers".to_string(), self.brokers.clone());
        properties.insert(
            "message.timeout.ms".to_string(),
            self.message_timeout_ms.clone(),
        );
        properties
    }

    pub fn client_config(&self) -> ClientConfig {
        client_config(&self.properties())
    }
}

/// Configuration for the listener container
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Consumer group ID
    pub group_id: String,
    /// Topic to consume from
    pub topic: String,
    /// Auto offset reset strategy ("earliest" or "latest")
    ///
    /// "earliest" so that a record produced before the group finished
    /// joining is still delivered.
    pub auto_offset_reset: String,
    /// Session timeout in milliseconds
    pub session_timeout_ms: String,
    /// Capacity of the channel between the listener task and receivers
    pub channel_capacity: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            brokers: DEFAULT_BROKERS.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: "6000".to_string(),
            channel_capacity: 16,
        }
    }
}

impl ConsumerConfig {
    pub fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("bootstrap.servers".to_string(), self.brokers.clone());
        properties.insert("group.id".to_string(), self.group_id.clone());
        properties.insert(
            "auto.offset.reset".to_string(),
            self.auto_offset_reset.clone(),
        );
        properties.insert(
            "session.timeout.ms".to_string(),
            self.session_timeout_ms.clone(),
        );
        properties.insert("enable.partition.eof".to_string(), "false".to_string());
        properties
    }

    pub fn client_config(&self) -> ClientConfig {
        client_config(&self.properties())
    }
}

fn client_config(properties: &Properties) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in properties {
        config.set(key, value);
    }
    config
}

/// Kafka connection options shared by the CLI commands.
#[derive(Args, Clone, Debug)]
pub struct KafkaOpts {
    /// Kafka brokers (comma-separated, e.g., "localhost:9092")
    #[arg(long, env = "KAFKA_BROKERS", default_value = DEFAULT_BROKERS)]
    pub brokers: String,

    /// Topic records are sent to and read back from
    #[arg(long, env = "KAFKA_TOPIC", default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Consumer group ID
    #[arg(long, env = "KAFKA_GROUP_ID", default_value = DEFAULT_GROUP_ID)]
    pub group_id: String,

    /// Producer delivery timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub message_timeout_ms: String,

    /// Consumer session timeout in milliseconds
    #[arg(long, default_value = "6000")]
    pub session_timeout_ms: String,

    /// Deadline for each round trip (e.g. "10s", "500ms", "1m")
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Records buffered between the consumer task and the receiver
    #[arg(long, default_value_t = 16)]
    pub channel_capacity: usize,
}

impl KafkaOpts {
    pub fn producer_config(&self) -> ProducerConfig {
        ProducerConfig {
            brokers: self.brokers.clone(),
            message_timeout_ms: self.message_timeout_ms.clone(),
            ..Default::default()
        }
    }

    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            brokers: self.brokers.clone(),
            group_id: self.group_id.clone(),
            topic: self.topic.clone(),
            session_timeout_ms: self.session_timeout_ms.clone(),
            channel_capacity: self.channel_capacity,
            ..Default::default()
        }
    }
}
