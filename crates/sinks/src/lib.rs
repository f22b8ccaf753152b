//! Sluice - Sinks
//!
//! Output sinks that deliver processed `Record`s to their destination.
//!
//! # Available Sinks
//!
//! - **Kafka** - Produces to one topic with client-side batching,
//!   compression and a bounded per-record retry policy
//! - **Mock** - In-memory test double for broker-free pipeline tests
//!
//! # Design
//!
//! Workers share one sink through `&self`, so implementors must be
//! `Send + Sync` and handle concurrent sends. A `send` resolves once the
//! record is accepted durably (for Kafka, broker acknowledgement), which
//! is what makes delivery errors attributable to a single record.
//!
//! # Example
//!
//! ```ignore
//! use sluice_sinks::{KafkaSink, Sink};
//!
//! let sink = KafkaSink::new(config.output).await?;
//!
//! sink.send(record).await?;
//! sink.close().await?;
//! ```

use std::future::Future;
use std::pin::Pin;

use sluice_protocol::Record;

pub mod kafka;
pub mod mock;

mod error;

pub use error::SinkError;
pub use kafka::{KafkaSink, KafkaSinkMetrics, KafkaSinkMetricsHandle, KafkaSinkMetricsSnapshot};
pub use mock::MockSink;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for record sinks
///
/// Implementors must be `Send + Sync` to allow concurrent use across
/// worker tasks.
///
/// # Example
///
/// ```ignore
/// struct MySink;
///
/// impl Sink for MySink {
///     fn send<'a>(
///         &'a self,
///         record: Record,
///     ) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
///         Box::pin(async move {
///             // Deliver the record
///             Ok(())
///         })
///     }
///
///     fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
///         Box::pin(async move { Ok(()) })
///     }
///
///     fn name(&self) -> &'static str {
///         "my_sink"
///     }
/// }
/// ```
pub trait Sink: Send + Sync {
    /// Deliver one record
    ///
    /// Resolves `Ok` once the record is accepted by the destination, `Err`
    /// once every attempt allowed by the retry policy has failed.
    fn send<'a>(
        &'a self,
        record: Record,
    ) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>>;

    /// Flush buffered deliveries and release connections
    ///
    /// Called once during graceful shutdown, after every worker has
    /// stopped sending.
    fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>>;

    /// Name of this sink for logging
    fn name(&self) -> &'static str;
}
