//! Protobuf codec adapters for Kafka keys and values.
//!
//! The adapters do no encoding work of their own: [`ProtobufSerializer`] hands
//! a message to its generated `write_to_bytes`, and [`ProtobufDeserializer`]
//! hands bytes to the generated `parse_from_bytes`. Both are zero-sized and
//! hold no state, so one instance can be shared by any number of threads.

use crate::config::Properties;
use crate::error::{FormatError, Operation, Result};
use std::fmt;
use std::marker::PhantomData;

/// Turns a value into the bytes placed in a Kafka record key or value.
pub trait Serializer<T: ?Sized>: Send + Sync {
    /// Called once with the client properties before the first record.
    fn configure(&mut self, _properties: &Properties, _is_key: bool) {}

    fn serialize(&self, topic: &str, data: &T) -> Result<Vec<u8>>;

    /// Called once when the owning client shuts down.
    fn close(&mut self) {}
}

/// Turns the bytes of a Kafka record key or value back into a value.
pub trait Deserializer<T>: Send + Sync {
    /// Called once with the client properties before the first record.
    fn configure(&mut self, _properties: &Properties, _is_key: bool) {}

    fn deserialize(&self, topic: &str, data: &[u8]) -> Result<T>;

    /// Called once when the owning client shuts down.
    fn close(&mut self) {}
}

/// Encodes any generated protobuf message to its canonical binary form.
pub struct ProtobufSerializer<M> {
    _message: PhantomData<fn(&M)>,
}

/// Parses the canonical binary form back into a generated protobuf message.
pub struct ProtobufDeserializer<M> {
    _message: PhantomData<fn() -> M>,
}

impl<M> ProtobufSerializer<M> {
    pub const fn new() -> Self {
        Self {
            _message: PhantomData,
        }
    }
}

impl<M> ProtobufDeserializer<M> {
    pub const fn new() -> Self {
        Self {
            _message: PhantomData,
        }
    }
}

// Manual impls: derives would wrongly require `M: Clone`, `M: Default`, ...
impl<M> Clone for ProtobufSerializer<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ProtobufSerializer<M> {}

impl<M> Default for ProtobufSerializer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for ProtobufSerializer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtobufSerializer<{}>", std::any::type_name::<M>())
    }
}

impl<M> Clone for ProtobufDeserializer<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ProtobufDeserializer<M> {}

impl<M> Default for ProtobufDeserializer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for ProtobufDeserializer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtobufDeserializer<{}>", std::any::type_name::<M>())
    }
}

impl<M: protobuf::Message> Serializer<M> for ProtobufSerializer<M> {
    fn serialize(&self, topic: &str, data: &M) -> Result<Vec<u8>> {
        data.write_to_bytes().map_err(|source| {
            FormatError {
                operation: Operation::Encode,
                topic: topic.to_string(),
                message_type: M::NAME,
                source,
            }
            .into()
        })
    }
}

impl<M: protobuf::Message> Deserializer<M> for ProtobufDeserializer<M> {
    fn deserialize(&self, topic: &str, data: &[u8]) -> Result<M> {
        M::parse_from_bytes(data).map_err(|source| {
            FormatError {
                operation: Operation::Decode,
                topic: topic.to_string(),
                message_type: M::NAME,
                source,
            }
            .into()
        })
    }
}

/// Encode a message outside of any topic context.
pub fn encode<M: protobuf::Message>(message: &M) -> Result<Vec<u8>> {
    ProtobufSerializer::<M>::new().serialize("", message)
}

/// Decode a message outside of any topic context.
pub fn decode<M: protobuf::Message>(payload: &[u8]) -> Result<M> {
    ProtobufDeserializer::<M>::new().deserialize("", payload)
}
