//! Command-line interface for kafka-protobuf-serde
//!
//! # Usage Examples
//!
//! ```bash
//! # Round trip both sample messages through an embedded broker
//! kafka-protobuf-serde roundtrip --embedded
//!
//! # Round trip the proto3 sample through a running broker
//! kafka-protobuf-serde roundtrip --variant proto3 \
//!   --brokers localhost:9092 --topic serde-check --timeout 30s
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use kafka_protobuf_serde::testing::{HarnessConfig, RoundTripHarness};
use kafka_protobuf_serde::KafkaOpts;
use std::fmt::Debug;
use test_messages::samples;

#[derive(Parser)]
#[command(name = "kafka-protobuf-serde")]
#[command(about = "Check that protobuf messages survive a trip through Kafka")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send sample messages as key and value, read them back, and compare
    Roundtrip {
        /// Which sample message(s) to send
        #[arg(long, value_enum, default_value = "both")]
        variant: Variant,

        /// Start an in-process broker instead of connecting to --brokers
        #[arg(long)]
        embedded: bool,

        #[command(flatten)]
        kafka: KafkaOpts,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Variant {
    Proto2,
    Proto3,
    Both,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kafka_protobuf_serde=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Roundtrip {
            variant,
            embedded,
            kafka,
        } => run_roundtrip(variant, embedded, kafka).await,
    }
}

async fn run_roundtrip(variant: Variant, embedded: bool, kafka: KafkaOpts) -> anyhow::Result<()> {
    let harness = if embedded {
        RoundTripHarness::start(HarnessConfig {
            topic: kafka.topic.clone(),
            group_id: kafka.group_id.clone(),
            timeout: kafka.timeout,
            ..Default::default()
        })
        .await
        .context("Failed to start embedded broker")?
    } else {
        RoundTripHarness::connect(kafka.producer_config(), kafka.consumer_config(), kafka.timeout)
            .await
            .with_context(|| format!("Failed to connect to {}", kafka.brokers))?
    };

    let result = run_variants(&harness, variant).await;
    harness.shutdown().await;
    result
}

async fn run_variants(harness: &RoundTripHarness, variant: Variant) -> anyhow::Result<()> {
    if matches!(variant, Variant::Proto2 | Variant::Both) {
        check(harness, &samples::hello_world()).await?;
    }
    if matches!(variant, Variant::Proto3 | Variant::Both) {
        check(harness, &samples::goodbye_world()).await?;
    }
    Ok(())
}

async fn check<M>(harness: &RoundTripHarness, message: &M) -> anyhow::Result<()>
where
    M: protobuf::Message + PartialEq + Debug,
{
    let round_trip = harness
        .round_trip(message)
        .await
        .with_context(|| format!("Round trip of {} failed", M::NAME))?;

    if &round_trip.key != message {
        anyhow::bail!("{} key mismatch: sent {message:?}, got {:?}", M::NAME, round_trip.key);
    }
    if &round_trip.value != message {
        anyhow::bail!(
            "{} value mismatch: sent {message:?}, got {:?}",
            M::NAME,
            round_trip.value
        );
    }

    tracing::info!(
        "{} survived the round trip via {}[{}]@{}",
        M::NAME,
        round_trip.metadata.topic,
        round_trip.metadata.partition,
        round_trip.metadata.offset
    );
    Ok(())
}
