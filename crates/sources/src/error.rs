//! Source error types

use sluice_protocol::ProtocolError;
use thiserror::Error;

/// Errors from the consuming side of the pipeline
///
/// Construction errors (`Client`, `Subscribe`, `Protocol`) abort startup.
/// `Fetch` and `Deserialize` are reported on the error channel and polling
/// continues.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to build the consumer client
    #[error("failed to create consumer for {brokers}: {source}")]
    Client {
        /// Bootstrap addresses the client was configured with
        brokers: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// Failed to subscribe to or assign the topic
    #[error("failed to subscribe to '{topic}': {source}")]
    Subscribe {
        /// Topic that was requested
        topic: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// Transient fetch failure, polling continues
    #[error("fetch error: {0}")]
    Fetch(#[from] rdkafka::error::KafkaError),

    /// A consumed value payload could not be decoded
    #[error("failed to deserialize record from {topic}[{partition}]@{offset}: {source}")]
    Deserialize {
        topic: String,
        partition: i32,
        offset: i64,
        #[source]
        source: ProtocolError,
    },

    /// Payload format rejected at construction
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The record channel receiver went away while polling
    #[error("record channel closed")]
    ChannelClosed,
}

impl SourceError {
    /// Create a deserialization error with record provenance
    pub fn deserialize(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        source: ProtocolError,
    ) -> Self {
        Self::Deserialize {
            topic: topic.into(),
            partition,
            offset,
            source,
        }
    }
}
