//! Input configuration
//!
//! Describes the consumed side of the pipeline: broker addresses, topic,
//! consumer group, payload format and fetch tuning. Fields without a serde
//! default are required and fail deserialization when absent.

use serde::Deserialize;
use sluice_protocol::PayloadFormat;
use std::time::Duration;

/// Consumer offset reset policy for a new consumer group
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    /// Start from the earliest retained offset
    Earliest,
    /// Start from the next produced record (default)
    #[default]
    Latest,
}

impl OffsetReset {
    /// Broker property value for this policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Latest => "latest",
        }
    }
}

/// Input (consumer) configuration
///
/// # Example
///
/// ```yaml
/// input:
///   brokers: ["localhost:9092"]
///   topic: events
///   format: json
///   workers: 4
///   offset_reset: earliest
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Broker bootstrap addresses (required)
    pub brokers: Vec<String>,

    /// Topic to consume (required)
    pub topic: String,

    /// Consumer group id
    /// Default: "default-group"
    #[serde(default = "default_consumer_group_id")]
    pub consumer_group_id: String,

    /// Payload format of consumed records (required)
    pub format: PayloadFormat,

    /// Schema registry URL (required for avro/protobuf formats)
    #[serde(default)]
    pub schema_registry_url: Option<String>,

    /// Number of pipeline workers applying the processor chain
    /// Default: 1
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Where to start when the group has no committed offset
    /// Default: latest
    #[serde(default)]
    pub offset_reset: OffsetReset,

    /// Whether the consumer commits offsets automatically
    /// Default: false
    #[serde(default)]
    pub enable_auto_commit: bool,

    /// Auto-commit interval (only applied when auto-commit is enabled)
    /// Default: 5s
    #[serde(default = "default_auto_commit_interval", with = "humantime_serde")]
    pub auto_commit_interval: Duration,

    /// Explicit partition assignment; empty or absent consumes all partitions
    #[serde(default)]
    pub partitions: Option<Vec<i32>>,

    /// Minimum bytes the broker accumulates before answering a fetch
    /// Default: 1024
    #[serde(default = "default_min_bytes")]
    pub min_bytes: usize,

    /// Maximum bytes returned by a single fetch
    /// Default: 1048576 (1MB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum time in milliseconds the broker waits to fill min_bytes
    /// Default: 500
    #[serde(default = "default_max_wait_time")]
    pub max_wait_time: u64,

    /// Consumer session timeout
    /// Default: 10s
    #[serde(default = "default_session_timeout", with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Consumer heartbeat interval
    /// Default: 3s
    #[serde(default = "default_heartbeat_interval", with = "humantime_serde")]
    pub heartbeat_interval: Duration,
}

fn default_consumer_group_id() -> String {
    InputConfig::DEFAULT_CONSUMER_GROUP_ID.to_string()
}

fn default_workers() -> usize {
    1
}

fn default_auto_commit_interval() -> Duration {
    InputConfig::DEFAULT_AUTO_COMMIT_INTERVAL
}

fn default_min_bytes() -> usize {
    1024
}

fn default_max_bytes() -> usize {
    1024 * 1024
}

fn default_max_wait_time() -> u64 {
    500
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_heartbeat_interval() -> Duration {
    Duration::from_secs(3)
}

impl InputConfig {
    /// Consumer group used when none is configured
    pub const DEFAULT_CONSUMER_GROUP_ID: &'static str = "default-group";

    /// Default auto-commit interval
    pub const DEFAULT_AUTO_COMMIT_INTERVAL: Duration = Duration::from_secs(5);

    /// Get the explicitly assigned partitions, if any
    ///
    /// Returns `None` for both an absent and an empty list, which mean the
    /// same thing: consume every partition of the topic.
    pub fn assigned_partitions(&self) -> Option<&[i32]> {
        match self.partitions.as_deref() {
            Some([]) | None => None,
            Some(parts) => Some(parts),
        }
    }
}
