//! Sluice - Pipeline
//!
//! The execution engine that connects the source to the sink through a
//! worker pool.
//!
//! # Architecture
//!
//! ```text
//! [Kafka] ──→ KafkaSource ──→ mpsc::Receiver ──→ [Dispatcher]
//!                  │                            N workers, free-pull
//!                  │                          Chain ──→ Sink::send ──→ [Kafka]
//!                  └──→ error channel ──→ error drain ──→ tracing
//! ```
//!
//! # Key Design
//!
//! - **Channel-based**: one bounded `tokio::sync::mpsc` channel carries
//!   decoded records; a second carries ingestion and decode errors
//! - **Backpressure**: the source awaits channel capacity, so a slow sink
//!   throttles polling instead of growing a queue
//! - **Free-pull workers**: every worker pulls the next available record;
//!   run one worker when per-partition order matters
//! - **Single token**: one `CancellationToken` stops source, workers and
//!   reporter; the shutdown order is source, then workers, then sink
//! - **Observable**: atomic flow counters and lifecycle states stay
//!   readable through handles after `run()` consumes the owners
//!
//! # Example
//!
//! ```ignore
//! use sluice_pipeline::Pipeline;
//! use sluice_processor::create_default_registry;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = Config::from_file("config.yml")?;
//! let registry = create_default_registry();
//!
//! let pipeline = Pipeline::from_config(&config, &registry).await?;
//! let cancel = CancellationToken::new();
//!
//! // Cancel from a signal handler to shut down gracefully
//! pipeline.run(cancel).await?;
//! ```

mod dispatcher;
mod error;
mod metrics;
mod pipeline;
mod reporter;

pub use dispatcher::{Dispatcher, DispatcherState, DispatcherStateHandle};
pub use error::{PipelineError, PipelineResult};
pub use metrics::{PipelineMetrics, PipelineMetricsHandle, PipelineMetricsSnapshot};
pub use pipeline::{Pipeline, PipelineState, PipelineStateHandle};
pub use reporter::{DEFAULT_REPORT_INTERVAL, MetricsReporter};

// Re-export key types from dependencies for convenience
pub use sluice_processor::Chain;
pub use sluice_protocol::Record;
pub use sluice_sinks::Sink;

/// Buffer size of the decoded record channel
pub const RECORD_CHANNEL_CAPACITY: usize = 1000;

/// Buffer size of the source error channel
pub const ERROR_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod dispatcher_test;
