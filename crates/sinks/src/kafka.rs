//! Kafka Sink - Record delivery with bounded retries
//!
//! Produces processed `Record`s to one topic, re-encoding the value in the
//! configured output format and forwarding key, headers and timestamp
//! unchanged.
//!
//! # Design
//!
//! - **One retry policy**: Client-level retries are disabled
//!   (`message.send.max.retries=0`); the only retry loop is
//!   `send_with_retry`, bounded by `max_retries` with a fixed
//!   `retry_backoff` wait between attempts
//! - **Encode before the first attempt**: Encoding is deterministic, so an
//!   encode failure is never retried
//! - **Shared by workers**: `send` takes `&self`; the producer client
//!   multiplexes in-flight deliveries and handles batching per
//!   `batch_size`/`compression`
//! - **Flush on close**: `close()` drains everything the client still
//!   buffers before returning
//!
//! A full local queue fails the attempt like any other delivery error; the
//! retry backoff gives the queue time to drain. Records round-robin across
//! explicit target `partitions` when configured, otherwise the client's
//! partitioner places them.
//!
//! # Example
//!
//! ```ignore
//! use sluice_sinks::{KafkaSink, Sink};
//!
//! let sink = KafkaSink::new(config.output).await?;
//! let handle = sink.metrics_handle();
//!
//! sink.send(record).await?;
//! sink.close().await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use serde_json::Value;

use sluice_config::OutputConfig;
use sluice_protocol::{PayloadFormat, ProtocolError, Record, TEXT_MESSAGE_FIELD};

use crate::error::SinkError;
use crate::{Sink, SinkResult};

#[cfg(test)]
#[path = "kafka_test.rs"]
mod tests;

/// Kafka sink metrics
#[derive(Debug, Default)]
pub struct KafkaSinkMetrics {
    /// Records delivered and acknowledged
    pub records_sent: AtomicU64,

    /// Total encoded value bytes delivered
    pub bytes_sent: AtomicU64,

    /// Records whose value could not be encoded
    pub encode_errors: AtomicU64,

    /// Records lost after exhausting every delivery attempt
    pub delivery_errors: AtomicU64,

    /// Individual failed attempts that were retried
    pub retries: AtomicU64,
}

impl KafkaSinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            encode_errors: AtomicU64::new(0),
            delivery_errors: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    /// Record one acknowledged delivery and its payload size
    #[inline]
    pub fn record_sent(&self, bytes: u64) {
        self.records_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a value encode failure
    #[inline]
    pub fn encode_error(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record lost to exhausted retries
    #[inline]
    pub fn delivery_error(&self) {
        self.delivery_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed attempt that will be retried
    #[inline]
    pub fn retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> KafkaSinkMetricsSnapshot {
        KafkaSinkMetricsSnapshot {
            records_sent: self.records_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            delivery_errors: self.delivery_errors.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy)]
pub struct KafkaSinkMetricsSnapshot {
    pub records_sent: u64,
    pub bytes_sent: u64,
    pub encode_errors: u64,
    pub delivery_errors: u64,
    pub retries: u64,
}

/// Handle for accessing sink metrics
///
/// Holds an Arc to the metrics, so it remains valid while workers share
/// the sink.
#[derive(Clone)]
pub struct KafkaSinkMetricsHandle {
    metrics: Arc<KafkaSinkMetrics>,
}

impl KafkaSinkMetricsHandle {
    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> KafkaSinkMetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Kafka producer sink
///
/// Encodes records in the configured output format and delivers them to
/// one topic with a bounded per-record retry policy.
pub struct KafkaSink {
    /// Output configuration
    config: OutputConfig,

    /// Producer client, shared by workers through `&self`
    producer: FutureProducer,

    /// Explicit target partitions, absent when the client partitioner is
    /// in charge
    partitions: Option<Vec<i32>>,

    /// Cursor into `partitions` for round-robin placement
    round_robin: AtomicUsize,

    /// Metrics
    metrics: Arc<KafkaSinkMetrics>,
}

impl KafkaSink {
    /// Create a new Kafka sink
    ///
    /// Builds the producer client and, when `auto_create_topic` is set,
    /// creates the output topic once before any record is sent.
    ///
    /// # Errors
    /// Fails when the payload format is not encodable in this build, when
    /// the client cannot be created, or when topic creation fails.
    pub async fn new(config: OutputConfig) -> Result<Self, SinkError> {
        if !config.format.is_supported() {
            return Err(ProtocolError::unsupported_format(config.format.as_str()).into());
        }

        let producer: FutureProducer =
            producer_properties(&config)
                .create()
                .map_err(|e| SinkError::Client {
                    brokers: config.brokers.join(","),
                    source: e,
                })?;

        if config.auto_create_topic {
            create_topic(&config).await?;
        }

        tracing::info!(
            topic = %config.topic,
            format = %config.format,
            compression = config.compression.as_str(),
            "kafka sink ready"
        );

        Ok(Self {
            partitions: config.target_partitions().map(<[i32]>::to_vec),
            producer,
            config,
            round_robin: AtomicUsize::new(0),
            metrics: Arc::new(KafkaSinkMetrics::new()),
        })
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &KafkaSinkMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> KafkaSinkMetricsHandle {
        KafkaSinkMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Deliver one record, retrying failed attempts
    ///
    /// The partition is chosen once; retries re-send to the same place.
    async fn send_with_retry(&self, record: &Record) -> SinkResult<()> {
        let payload = encode_value(self.config.format, record).inspect_err(|_| {
            self.metrics.encode_error();
        })?;
        let partition = self.next_partition();
        let attempts = self.config.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                self.metrics.retry();
                tokio::time::sleep(self.config.retry_backoff).await;
            }

            match self.try_send(record, &payload, partition).await {
                Ok(()) => {
                    self.metrics.record_sent(payload.len() as u64);
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::debug!(
                        topic = %self.config.topic,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %e,
                        "delivery attempt failed"
                    );
                }
            }
        }

        self.metrics.delivery_error();
        Err(SinkError::Delivery {
            topic: self.config.topic.clone(),
            attempts,
            last_error,
        })
    }

    /// Enqueue one record and await the broker's acknowledgement
    async fn try_send(
        &self,
        record: &Record,
        payload: &[u8],
        partition: Option<i32>,
    ) -> Result<(), KafkaError> {
        let mut produce = FutureRecord::<[u8], [u8]>::to(&self.config.topic)
            .payload(payload)
            .timestamp(record.timestamp().timestamp_millis());

        if !record.key().is_empty() {
            produce = produce.key(record.key().as_ref());
        }
        if let Some(partition) = partition {
            produce = produce.partition(partition);
        }
        if !record.headers().is_empty() {
            produce = produce.headers(owned_headers(record.headers()));
        }

        match self
            .producer
            .send(produce, Timeout::After(Duration::ZERO))
            .await
        {
            Ok(_) => Ok(()),
            Err((e, _)) => Err(e),
        }
    }

    /// Pick the next target partition, advancing the round-robin cursor
    fn next_partition(&self) -> Option<i32> {
        let partitions = self.partitions.as_deref()?;
        let index = self.round_robin.fetch_add(1, Ordering::Relaxed) % partitions.len();
        Some(partitions[index])
    }
}

impl std::fmt::Debug for KafkaSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSink")
            .field("config", &self.config)
            .field("partitions", &self.partitions)
            .finish_non_exhaustive()
    }
}

impl Sink for KafkaSink {
    fn send<'a>(
        &'a self,
        record: Record,
    ) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
        Box::pin(async move { self.send_with_retry(&record).await })
    }

    fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let producer = self.producer.clone();
            let timeout = self.config.request_timeout;

            // flush blocks the calling thread until the queue drains
            let flushed = tokio::task::spawn_blocking(move || producer.flush(timeout)).await;
            match flushed {
                Ok(Ok(())) => {
                    let snapshot = self.metrics.snapshot();
                    tracing::info!(
                        topic = %self.config.topic,
                        records_sent = snapshot.records_sent,
                        "kafka sink closed"
                    );
                    Ok(())
                }
                Ok(Err(e)) => Err(SinkError::Flush(e.to_string())),
                Err(e) => Err(SinkError::Flush(e.to_string())),
            }
        })
    }

    fn name(&self) -> &'static str {
        "kafka"
    }
}

/// Map output configuration onto producer client properties
fn producer_properties(config: &OutputConfig) -> ClientConfig {
    let mut properties = ClientConfig::new();
    properties
        .set("bootstrap.servers", config.brokers.join(","))
        .set("batch.num.messages", config.batch_size.to_string())
        .set("compression.codec", config.compression.as_str())
        .set(
            "request.timeout.ms",
            config.request_timeout.as_millis().to_string(),
        )
        // retry policy lives in send_with_retry alone
        .set("message.send.max.retries", "0");
    properties
}

/// Create the output topic once at startup
///
/// An already-existing topic is not an error. When explicit target
/// partitions are configured, the topic is sized to cover the highest
/// listed partition; replication factor is 1.
async fn create_topic(config: &OutputConfig) -> SinkResult<()> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", config.brokers.join(","))
        .create()
        .map_err(|e| SinkError::Client {
            brokers: config.brokers.join(","),
            source: e,
        })?;

    let num_partitions = config
        .target_partitions()
        .map_or(1, |parts| parts.iter().copied().max().unwrap_or(0) + 1);
    let topic = NewTopic::new(&config.topic, num_partitions, TopicReplication::Fixed(1));

    let results = admin
        .create_topics(&[topic], &AdminOptions::new())
        .await
        .map_err(|e| SinkError::topic_create(&config.topic, e.to_string()))?;

    for result in results {
        match result {
            Ok(name) => {
                tracing::info!(topic = %name, partitions = num_partitions, "created output topic");
            }
            Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                tracing::debug!(topic = %name, "output topic already exists");
            }
            Err((name, code)) => {
                return Err(SinkError::topic_create(name, code.to_string()));
            }
        }
    }
    Ok(())
}

/// Encode a record's value in the output format
///
/// `json` serializes the processed `value_fields`, so processor mutations
/// reach the output. `string` writes the `message` field when it is a
/// string and falls back to the raw value bytes otherwise.
fn encode_value(format: PayloadFormat, record: &Record) -> SinkResult<Vec<u8>> {
    match format {
        PayloadFormat::Json => serde_json::to_vec(record.value_fields()).map_err(|e| {
            SinkError::encode(record.topic(), record.partition(), record.offset(), e)
        }),
        PayloadFormat::Text => Ok(match record.value_field(TEXT_MESSAGE_FIELD) {
            Some(Value::String(message)) => message.clone().into_bytes(),
            _ => record.value().to_vec(),
        }),
        PayloadFormat::Avro | PayloadFormat::Protobuf => {
            Err(ProtocolError::unsupported_format(format.as_str()).into())
        }
    }
}

/// Convert record headers into the client's owned header list
fn owned_headers(headers: &HashMap<String, String>) -> OwnedHeaders {
    let mut owned = OwnedHeaders::new_with_capacity(headers.len());
    for (key, value) in headers {
        owned = owned.insert(Header {
            key,
            value: Some(value),
        });
    }
    owned
}
