//! Kafka round-trip E2E tests
//!
//! Each scenario starts its own embedded broker, sends a protobuf message as
//! both key and value through the serializer, and checks the decoded record
//! against the original.

mod serialize;
