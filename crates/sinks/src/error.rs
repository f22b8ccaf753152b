//! Sink error types

use sluice_protocol::ProtocolError;
use thiserror::Error;

/// Errors from the producing side of the pipeline
///
/// Construction errors (`Client`, `TopicCreate`, `Protocol`) abort startup.
/// `Encode` and `Delivery` are per-record and reported by the worker that
/// attempted the send; the pipeline continues.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to build the producer client
    #[error("failed to create producer for {brokers}: {source}")]
    Client {
        /// Bootstrap addresses the client was configured with
        brokers: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// Topic auto-creation failed at startup
    #[error("failed to create topic '{topic}': {reason}")]
    TopicCreate {
        /// Topic that was requested
        topic: String,
        reason: String,
    },

    /// A record's value could not be encoded in the output format
    #[error("failed to encode record from {topic}[{partition}]@{offset}: {source}")]
    Encode {
        topic: String,
        partition: i32,
        offset: i64,
        #[source]
        source: serde_json::Error,
    },

    /// Every delivery attempt for one record failed
    #[error("all {attempts} delivery attempts to '{topic}' failed: {last_error}")]
    Delivery {
        /// Topic the record was destined for
        topic: String,
        /// Total attempts made, counting the first send
        attempts: u32,
        /// Message of the last failed attempt
        last_error: String,
    },

    /// Flushing buffered deliveries failed
    #[error("flush failed: {0}")]
    Flush(String),

    /// Payload format rejected at construction
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Failed to write to the destination
    #[error("write failed: {0}")]
    Write(String),
}

impl SinkError {
    /// Create an encoding error with record provenance
    pub fn encode(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        source: serde_json::Error,
    ) -> Self {
        Self::Encode {
            topic: topic.into(),
            partition,
            offset,
            source,
        }
    }

    /// Create a topic-creation error
    pub fn topic_create(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TopicCreate {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}
