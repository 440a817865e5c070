//! Protobuf message types for exercising the Kafka serde adapters.
//!
//! Two schema generations are compiled from `proto/` at build time:
//!
//! - [`Proto2Message`]: proto2, explicit field presence with a required `str`
//! - [`Proto3Message`]: proto3, unset fields fall back to default values
//!
//! Both carry the same four fields: `str` (string), `boolean` (bool),
//! `int` (int64) and `dbl` (double).

// Include generated protobuf code
include!(concat!(env!("OUT_DIR"), "/protos/mod.rs"));

pub mod samples;

// Re-export protobuf types for convenience
pub use proto2_message::Proto2Message;
pub use proto3_message::Proto3Message;
