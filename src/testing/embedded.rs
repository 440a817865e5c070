//! In-process Kafka broker backed by librdkafka's mock cluster.

use crate::error::Result;
use rdkafka::mocking::MockCluster;
use rdkafka::producer::DefaultProducerContext;

/// Default partition count for topics created by [`EmbeddedKafka`].
pub const DEFAULT_PARTITIONS_PER_TOPIC: i32 = 2;

/// An embedded single-broker Kafka cluster.
///
/// The broker lives exactly as long as this value; dropping it shuts the
/// cluster down. Clients connected to it should be closed first.
pub struct EmbeddedKafka {
    cluster: MockCluster<'static, DefaultProducerContext>,
    partitions_per_topic: i32,
}

impl EmbeddedKafka {
    /// Start a broker and create `topics`, each with `partitions_per_topic` partitions.
    pub fn start(partitions_per_topic: i32, topics: &[&str]) -> Result<Self> {
        let cluster = MockCluster::new(1)?;
        let broker = Self {
            cluster,
            partitions_per_topic,
        };
        for topic in topics {
            broker.create_topic(topic)?;
        }
        tracing::info!("Embedded Kafka listening on {}", broker.bootstrap_servers());
        Ok(broker)
    }

    pub fn create_topic(&self, topic: &str) -> Result<()> {
        self.cluster.create_topic(topic, self.partitions_per_topic, 1)?;
        tracing::info!(
            "Topic '{}' created with {} partition(s)",
            topic,
            self.partitions_per_topic
        );
        Ok(())
    }

    /// Comma-separated broker addresses for `bootstrap.servers`.
    pub fn bootstrap_servers(&self) -> String {
        self.cluster.bootstrap_servers()
    }

    pub fn partitions_per_topic(&self) -> i32 {
        self.partitions_per_topic
    }
}
