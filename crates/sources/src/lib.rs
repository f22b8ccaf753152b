//! Sluice - Sources
//!
//! Broker sources that consume raw records and produce decoded `Record`
//! instances for the pipeline.
//!
//! # Available Sources
//!
//! - **Kafka** - Continuous polling over one topic with group or explicit
//!   partition assignment
//!
//! # Design Principles
//!
//! - **Decode at the edge**: Payloads are decoded into field maps before a
//!   record enters the pipeline; undecodable payloads never reach a worker
//! - **Two channels**: Records and errors flow separately so error
//!   reporting cannot stall the record stream
//! - **Lossless backpressure**: The record channel is bounded and publishes
//!   await capacity
//! - **Single owner**: The consumer client lives on one poll task; there is
//!   no shared consumer state to lock
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
//! let cancel = CancellationToken::new();
//! tokio::spawn(source.run(cancel.clone()));
//! ```

pub mod kafka;

mod error;

pub use error::SourceError;
pub use kafka::{
    KafkaSource, KafkaSourceMetrics, KafkaSourceMetricsHandle, KafkaSourceMetricsSnapshot,
};
