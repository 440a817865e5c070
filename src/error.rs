use rdkafka::error::KafkaError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Direction of a failed codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Encode => f.write_str("encode"),
            Operation::Decode => f.write_str("decode"),
        }
    }
}

/// A message could not be turned into bytes, or bytes into a message.
#[derive(Error, Debug)]
#[error("Failed to {operation} {message_type} for topic '{topic}': {source}")]
pub struct FormatError {
    pub operation: Operation,
    pub topic: String,
    pub message_type: &'static str,
    #[source]
    pub source: protobuf::Error,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Error sending message to Kafka: {0}")]
    Transport(#[source] KafkaError),

    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Wait cancelled before completion")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this is an encode or decode failure.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
