//! Output configuration
//!
//! Describes the produced side of the pipeline: broker addresses, topic,
//! delivery batching, compression and retry policy.

use serde::Deserialize;
use sluice_protocol::PayloadFormat;
use std::time::Duration;

/// Inclusive bounds for `batch_size`
pub const BATCH_SIZE_RANGE: std::ops::RangeInclusive<usize> = 1..=100_000;

/// Output sink kind
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Produce to a Kafka topic
    Kafka,
}

/// Producer-side compression codec
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// No compression (default)
    #[default]
    None,
    /// Gzip
    Gzip,
    /// Snappy
    Snappy,
    /// LZ4
    Lz4,
    /// Zstandard
    Zstd,
}

impl Compression {
    /// Broker property value for this codec
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Snappy => "snappy",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }
}

/// Output (producer) configuration
///
/// # Example
///
/// ```yaml
/// output:
///   type: kafka
///   brokers: ["localhost:9092"]
///   topic: events-replayed
///   format: json
///   batch_size: 500
///   compression: zstd
///   auto_create_topic: true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output kind (required; only "kafka" is supported)
    #[serde(rename = "type")]
    pub output_type: OutputType,

    /// Broker bootstrap addresses (required)
    pub brokers: Vec<String>,

    /// Topic to produce to (required)
    pub topic: String,

    /// Producer worker hint; the client multiplexes deliveries internally
    /// Default: 1
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Payload format of produced records (required)
    pub format: PayloadFormat,

    /// Schema registry URL (required for avro/protobuf formats)
    #[serde(default)]
    pub schema_registry_url: Option<String>,

    /// Explicit target partitions; records round-robin across them.
    /// Empty or absent uses the client's default partitioner.
    #[serde(default)]
    pub partitions: Option<Vec<i32>>,

    /// Maximum records the client buffers into one produce batch
    /// Default: 2000, valid range 1..=100000
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Compression codec
    /// Default: none
    #[serde(default)]
    pub compression: Compression,

    /// Create the topic at startup if it does not exist
    /// Default: false
    #[serde(default)]
    pub auto_create_topic: bool,

    /// Broker request timeout
    /// Default: 30s
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Wait between delivery retry attempts
    /// Default: 2s
    #[serde(default = "default_retry_backoff", with = "humantime_serde")]
    pub retry_backoff: Duration,

    /// Delivery attempts after the first failure
    /// Default: 3
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_workers() -> usize {
    1
}

fn default_batch_size() -> usize {
    2000
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_backoff() -> Duration {
    Duration::from_secs(2)
}

fn default_max_retries() -> u32 {
    3
}

impl OutputConfig {
    /// Get the explicit target partitions, if any
    ///
    /// Returns `None` for both an absent and an empty list.
    pub fn target_partitions(&self) -> Option<&[i32]> {
        match self.partitions.as_deref() {
            Some([]) | None => None,
            Some(parts) => Some(parts),
        }
    }
}
