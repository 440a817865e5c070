//! Round trips of both schema variants through an embedded broker.
//!
//! Test flow:
//! 1. Start an embedded broker with the test topic
//! 2. Start a listener and wait for its partitions
//! 3. Send the message as key and value through `ProtobufSerializer`
//! 4. Decode the consumed record and compare field by field

use kafka_protobuf_serde::testing::{
    generate_test_id, init_tracing, HarnessConfig, RoundTripHarness,
};
use kafka_protobuf_serde::{
    ConsumerConfig, Deserializer, Error, ListenerContainer, ProducerConfig, ProducerRecord,
    ProtobufDeserializer, ProtobufProducer,
};
use std::time::Duration;
use test_messages::samples::{self, MIN_POSITIVE_SUBNORMAL};
use test_messages::{Proto2Message, Proto3Message};

/// Whole-scenario deadline
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn harness_config(name: &str) -> HarnessConfig {
    let test_id = generate_test_id();
    HarnessConfig {
        topic: format!("test-{name}-{test_id}"),
        group_id: format!("test.serializer.{name}-{test_id}"),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_serialize_proto2() -> anyhow::Result<()> {
    init_tracing();

    tokio::time::timeout(TEST_TIMEOUT, async {
        let harness = RoundTripHarness::start(harness_config("proto2")).await?;
        let message = samples::proto2("Hello World", true, i64::MIN, MIN_POSITIVE_SUBNORMAL);

        let round_trip = harness.round_trip(&message).await;
        harness.shutdown().await;
        let round_trip = round_trip?;

        assert_eq!(round_trip.key, message);
        assert_eq!(round_trip.value, message);
        assert_eq!(round_trip.value.int(), i64::MIN);
        assert_eq!(
            round_trip.value.dbl().to_bits(),
            MIN_POSITIVE_SUBNORMAL.to_bits()
        );
        anyhow::Ok(())
    })
    .await?
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_serialize_proto3() -> anyhow::Result<()> {
    init_tracing();

    tokio::time::timeout(TEST_TIMEOUT, async {
        let harness = RoundTripHarness::start(harness_config("proto3")).await?;
        let message = samples::proto3("Goodbye World", false, i64::MAX, f64::MAX);

        let round_trip = harness.round_trip(&message).await;
        harness.shutdown().await;
        let round_trip = round_trip?;

        assert_eq!(round_trip.key, message);
        assert_eq!(round_trip.value, message);
        anyhow::Ok(())
    })
    .await?
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_both_variants_share_one_pipeline() -> anyhow::Result<()> {
    init_tracing();

    tokio::time::timeout(TEST_TIMEOUT * 2, async {
        let harness = RoundTripHarness::start(harness_config("mixed")).await?;

        let proto2 = samples::hello_world();
        let proto3 = samples::goodbye_world();
        let first = harness.round_trip(&proto2).await;
        let second = harness.round_trip(&proto3).await;
        harness.shutdown().await;

        let (first, second) = (first?, second?);
        assert_eq!(first.key, proto2);
        assert_eq!(first.value, proto2);
        assert_eq!(second.key, proto3);
        assert_eq!(second.value, proto3);
        anyhow::Ok(())
    })
    .await?
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_round_trip_skips_earlier_records() -> anyhow::Result<()> {
    init_tracing();

    tokio::time::timeout(TEST_TIMEOUT, async {
        let config = harness_config("stray");
        let harness = RoundTripHarness::start(config.clone()).await?;
        let brokers = harness
            .bootstrap_servers()
            .ok_or_else(|| anyhow::anyhow!("harness has no embedded broker"))?;

        let producer =
            ProtobufProducer::<Proto2Message, Proto2Message>::protobuf(&ProducerConfig {
                brokers,
                ..Default::default()
            })?;
        let stray = samples::proto2("stray", false, 7, 1.5);
        producer
            .send(ProducerRecord::to(&config.topic).key(&stray).value(&stray))
            .await?;
        producer.close(config.timeout)?;

        let message = samples::hello_world();
        let round_trip = harness.round_trip(&message).await;
        harness.shutdown().await;
        let round_trip = round_trip?;

        assert_eq!(round_trip.key, message);
        assert_eq!(round_trip.value, message);
        anyhow::Ok(())
    })
    .await?
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wrong_schema_is_rejected_on_decode() -> anyhow::Result<()> {
    init_tracing();

    tokio::time::timeout(TEST_TIMEOUT, async {
        let config = harness_config("wrong-schema");
        let harness = RoundTripHarness::start(config.clone()).await?;
        let brokers = harness
            .bootstrap_servers()
            .ok_or_else(|| anyhow::anyhow!("harness has no embedded broker"))?;

        // A default-valued proto3 message encodes to nothing, which lacks
        // the required proto2 field
        let producer =
            ProtobufProducer::<Proto3Message, Proto3Message>::protobuf(&ProducerConfig {
                brokers: brokers.clone(),
                ..Default::default()
            })?;
        let empty = Proto3Message::new();
        producer
            .send(ProducerRecord::to(&config.topic).key(&empty).value(&empty))
            .await?;
        producer.close(config.timeout)?;

        let listener = ListenerContainer::start(&ConsumerConfig {
            brokers,
            group_id: format!("{}-second", config.group_id),
            topic: config.topic.clone(),
            ..Default::default()
        })?;
        let record = listener.recv_timeout(config.timeout).await;
        listener.stop().await;
        harness.shutdown().await;

        // librdkafka may report a zero-length payload as absent
        let payload = record?.value.unwrap_or_default();
        let err = ProtobufDeserializer::<Proto2Message>::new()
            .deserialize(&config.topic, &payload)
            .unwrap_err();
        assert!(err.is_format(), "expected format error, got {err:?}");
        anyhow::Ok(())
    })
    .await?
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_wait_is_not_success() -> anyhow::Result<()> {
    init_tracing();

    let config = harness_config("cancel");
    let harness = RoundTripHarness::start(config.clone()).await?;
    let brokers = harness
        .bootstrap_servers()
        .ok_or_else(|| anyhow::anyhow!("harness has no embedded broker"))?;

    let listener = ListenerContainer::start(&ConsumerConfig {
        brokers,
        group_id: format!("{}-idle", config.group_id),
        topic: config.topic,
        ..Default::default()
    })?;
    let token = listener.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let outcome = listener.recv_timeout(TEST_TIMEOUT).await;
    listener.stop().await;
    harness.shutdown().await;

    assert!(matches!(outcome, Err(Error::Cancelled)));
    Ok(())
}
