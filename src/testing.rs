//! Round-trip test infrastructure
//!
//! This module provides an embedded broker and a per-scenario fixture that
//! sends a protobuf message through Kafka as both key and value, reads it
//! back, and decodes it again.
//!

pub mod embedded;
pub mod harness;
pub mod test_helpers;

pub use embedded::EmbeddedKafka;
pub use harness::{HarnessConfig, RoundTrip, RoundTripHarness};
pub use test_helpers::{generate_test_id, init_tracing};
