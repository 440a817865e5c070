//! Protobuf serializers and deserializers for Kafka.
//!
//! Lets a Kafka client carry generated Protocol Buffers messages as record
//! keys and values. The codec work is entirely the generated code's; this
//! crate adapts it to a serializer interface and wires it into rdkafka.
//!
//! # Features
//!
//! - Codec adapters: [`ProtobufSerializer`] / [`ProtobufDeserializer`] for any `protobuf::Message`
//! - Typed producer: [`Producer`] runs keys and values through serializers before sending
//! - Listener container: [`ListenerContainer`] drains a topic into a bounded channel
//! - Test harness: [`testing`] embeds a broker and checks round trips
//!
//! # Usage
//!
//! ```rust,no_run
//! use kafka_protobuf_serde::{ProducerConfig, ProducerRecord, ProtobufProducer};
//! use test_messages::samples;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let producer = ProtobufProducer::protobuf(&ProducerConfig::default())?;
//!     let message = samples::hello_world();
//!
//!     producer
//!         .send(ProducerRecord::to("topic").key(&message).value(&message))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod consumer;
pub mod error;
pub mod producer;
pub mod serde;
pub mod testing;

// Re-export main types for easy access
pub use config::{ConsumerConfig, KafkaOpts, ProducerConfig, Properties};
pub use consumer::{ConsumedRecord, ListenerContainer};
pub use error::{Error, FormatError, Operation, Result};
pub use producer::{Producer, ProducerRecord, ProtobufProducer, RecordMetadata};
pub use serde::{
    decode, encode, Deserializer, ProtobufDeserializer, ProtobufSerializer, Serializer,
};
