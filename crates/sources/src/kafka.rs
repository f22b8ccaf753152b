//! Kafka Source - Continuous record polling
//!
//! Consumes one topic and publishes decoded `Record`s on a bounded channel,
//! with ingestion and decode errors on a separate channel so a bad payload
//! never stalls the stream.
//!
//! # Design
//!
//! - **One poll task**: The consumer client is owned by `run()` alone; no
//!   locking around fetches
//! - **Decode before publish**: A record's `value_fields` are populated
//!   here, so downstream processors never see an undecodable payload
//! - **Lossless backpressure**: Publishing awaits channel capacity; a slow
//!   sink throttles polling instead of dropping records
//! - **Non-fatal decode errors**: Reported with provenance on the error
//!   channel while polling continues
//!
//! Offsets are committed by the client only when `enable_auto_commit` is
//! set. With it off (the default), a restart re-reads per `offset_reset`,
//! which suits replay runs.
//!
//! # Example
//!
//! ```ignore
//! use sluice_sources::KafkaSource;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! let (record_tx, record_rx) = mpsc::channel(1000);
//! let (error_tx, error_rx) = mpsc::channel(1000);
//!
//! let source = KafkaSource::new(config.input, record_tx, error_tx)?;
//! let handle = source.metrics_handle();
//! tokio::spawn(source.run(cancel.clone()));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Headers, Message};
use rdkafka::{Timestamp, TopicPartitionList};
use serde_json::Map;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sluice_config::InputConfig;
use sluice_protocol::{Deserializer, Record, RecordBuilder};

use crate::error::SourceError;

#[cfg(test)]
#[path = "kafka_test.rs"]
mod tests;

/// Kafka source metrics
#[derive(Debug, Default)]
pub struct KafkaSourceMetrics {
    /// Raw records fetched from the broker, counted before decoding
    pub records_read: AtomicU64,

    /// Total value payload bytes fetched
    pub bytes_read: AtomicU64,

    /// Records whose value payload failed to decode
    pub decode_errors: AtomicU64,

    /// Transient fetch failures
    pub fetch_errors: AtomicU64,
}

impl KafkaSourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_read: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            fetch_errors: AtomicU64::new(0),
        }
    }

    /// Record one fetched record and its payload size
    #[inline]
    pub fn record_read(&self, bytes: u64) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a value decode failure
    #[inline]
    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transient fetch failure
    #[inline]
    pub fn fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> KafkaSourceMetricsSnapshot {
        KafkaSourceMetricsSnapshot {
            records_read: self.records_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of source metrics
#[derive(Debug, Clone, Copy)]
pub struct KafkaSourceMetricsSnapshot {
    pub records_read: u64,
    pub bytes_read: u64,
    pub decode_errors: u64,
    pub fetch_errors: u64,
}

/// Handle for accessing source metrics
///
/// Holds an Arc to the metrics, so it remains valid after `run()` consumes
/// the source.
#[derive(Clone)]
pub struct KafkaSourceMetricsHandle {
    metrics: Arc<KafkaSourceMetrics>,
}

impl KafkaSourceMetricsHandle {
    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> KafkaSourceMetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Kafka consumer source
///
/// Fetches records from one topic, decodes their payloads and publishes
/// them for the worker pool. Within one partition, records are published
/// in non-decreasing offset order.
pub struct KafkaSource {
    /// Input configuration
    config: InputConfig,

    /// Consumer client, owned by the poll loop
    consumer: StreamConsumer,

    /// Value/key payload decoder
    deserializer: Deserializer,

    /// Decoded records, bounded for backpressure
    record_tx: mpsc::Sender<Record>,

    /// Ingestion and decode errors
    error_tx: mpsc::Sender<SourceError>,

    /// Metrics
    metrics: Arc<KafkaSourceMetrics>,
}

impl KafkaSource {
    /// Create a new Kafka source
    ///
    /// Builds the consumer client and subscribes to the configured topic
    /// (or assigns the explicit partitions when `partitions` is set).
    ///
    /// # Errors
    /// Fails when the payload format is not decodable in this build, or
    /// when the client cannot be created or subscribed.
    pub fn new(
        config: InputConfig,
        record_tx: mpsc::Sender<Record>,
        error_tx: mpsc::Sender<SourceError>,
    ) -> Result<Self, SourceError> {
        let deserializer = Deserializer::new(config.format)?;

        if config.consumer_group_id == InputConfig::DEFAULT_CONSUMER_GROUP_ID {
            tracing::warn!(
                group = %config.consumer_group_id,
                "consumer_group_id has not been provided, using the default"
            );
        }

        if !config.enable_auto_commit
            && config.auto_commit_interval != InputConfig::DEFAULT_AUTO_COMMIT_INTERVAL
        {
            tracing::warn!(
                interval = ?config.auto_commit_interval,
                "auto_commit_interval is ignored because enable_auto_commit is false"
            );
        }

        let consumer: StreamConsumer =
            consumer_properties(&config)
                .create()
                .map_err(|e| SourceError::Client {
                    brokers: config.brokers.join(","),
                    source: e,
                })?;

        match config.assigned_partitions() {
            Some(partitions) => {
                let mut assignment = TopicPartitionList::new();
                for partition in partitions {
                    assignment.add_partition(&config.topic, *partition);
                }
                consumer
                    .assign(&assignment)
                    .map_err(|e| SourceError::Subscribe {
                        topic: config.topic.clone(),
                        source: e,
                    })?;
                tracing::info!(
                    topic = %config.topic,
                    partitions = ?partitions,
                    "consumer assigned to explicit partitions"
                );
            }
            None => {
                consumer
                    .subscribe(&[config.topic.as_str()])
                    .map_err(|e| SourceError::Subscribe {
                        topic: config.topic.clone(),
                        source: e,
                    })?;
            }
        }

        Ok(Self {
            config,
            consumer,
            deserializer,
            record_tx,
            error_tx,
            metrics: Arc::new(KafkaSourceMetrics::new()),
        })
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &KafkaSourceMetrics {
        &self.metrics
    }

    /// Get a metrics handle that outlives `run()`
    pub fn metrics_handle(&self) -> KafkaSourceMetricsHandle {
        KafkaSourceMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Run the poll loop until cancellation
    ///
    /// Both channels close when this returns, so downstream consumers are
    /// never left blocked on a stopped source.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), SourceError> {
        tracing::info!(
            topic = %self.config.topic,
            group = %self.config.consumer_group_id,
            format = %self.config.format,
            offset_reset = %self.config.offset_reset.as_str(),
            "kafka source polling"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                fetched = self.consumer.recv() => match fetched {
                    Ok(message) => self.handle_message(&message, &cancel).await?,
                    Err(e) => {
                        self.metrics.fetch_error();
                        self.report(SourceError::Fetch(e), &cancel).await;
                    }
                },
            }
        }

        tracing::info!(topic = %self.config.topic, "kafka source stopped");
        Ok(())
    }

    /// Decode one fetched message and publish the record
    ///
    /// A decode failure is reported and polling continues. A closed record
    /// channel outside of shutdown stops the loop with an error.
    async fn handle_message(
        &self,
        message: &BorrowedMessage<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), SourceError> {
        let payload_bytes = message.payload().map_or(0, |p| p.len()) as u64;
        self.metrics.record_read(payload_bytes);

        let record = match self.build_record(message) {
            Ok(record) => record,
            Err(e) => {
                self.metrics.decode_error();
                self.report(e, cancel).await;
                return Ok(());
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Ok(()),
            sent = self.record_tx.send(record) => {
                if sent.is_err() && !cancel.is_cancelled() {
                    return Err(SourceError::ChannelClosed);
                }
                Ok(())
            }
        }
    }

    /// Convert a fetched message into a pipeline record
    fn build_record(&self, message: &BorrowedMessage<'_>) -> Result<Record, SourceError> {
        let key = message.key().map(Bytes::copy_from_slice).unwrap_or_default();
        let value = message.payload().map(Bytes::copy_from_slice).unwrap_or_default();

        let value_fields = self.deserializer.deserialize(&value).map_err(|e| {
            SourceError::deserialize(message.topic(), message.partition(), message.offset(), e)
        })?;

        // Keys are routinely plain strings; one that does not parse in the
        // configured format just leaves key_fields empty.
        let key_fields = if key.is_empty() {
            Map::new()
        } else {
            self.deserializer.deserialize(&key).unwrap_or_default()
        };

        Ok(
            RecordBuilder::new(message.topic(), message.partition(), message.offset())
                .key(key)
                .value(value)
                .timestamp(record_timestamp(message.timestamp()))
                .headers(headers_map(message))
                .key_fields(key_fields)
                .value_fields(value_fields)
                .build(),
        )
    }

    /// Publish an error without ever blocking past cancellation
    async fn report(&self, error: SourceError, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = self.error_tx.send(error) => {}
        }
    }
}

impl std::fmt::Debug for KafkaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSource")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Map declarative input settings onto consumer client properties
fn consumer_properties(config: &InputConfig) -> ClientConfig {
    let mut properties = ClientConfig::new();
    properties
        .set("bootstrap.servers", config.brokers.join(","))
        .set("group.id", &config.consumer_group_id)
        .set("auto.offset.reset", config.offset_reset.as_str())
        .set("enable.auto.commit", config.enable_auto_commit.to_string())
        .set("fetch.min.bytes", config.min_bytes.to_string())
        .set("fetch.max.bytes", config.max_bytes.to_string())
        .set("fetch.wait.max.ms", config.max_wait_time.to_string())
        .set("session.timeout.ms", config.session_timeout.as_millis().to_string())
        .set(
            "heartbeat.interval.ms",
            config.heartbeat_interval.as_millis().to_string(),
        );

    if config.enable_auto_commit {
        properties.set(
            "auto.commit.interval.ms",
            config.auto_commit_interval.as_millis().to_string(),
        );
    }

    properties
}

/// Convert the broker timestamp, falling back to the fetch instant
fn record_timestamp(timestamp: Timestamp) -> DateTime<Utc> {
    timestamp
        .to_millis()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now)
}

/// Collect message headers into an owned string map
///
/// Headers without a value are skipped; values are copied lossily.
fn headers_map(message: &BorrowedMessage<'_>) -> HashMap<String, String> {
    let Some(headers) = message.headers() else {
        return HashMap::new();
    };

    headers
        .iter()
        .filter_map(|header| {
            header.value.map(|value| {
                (
                    header.key.to_string(),
                    String::from_utf8_lossy(value).into_owned(),
                )
            })
        })
        .collect()
}
