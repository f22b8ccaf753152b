//! Sluice - Processor
//!
//! Processor chain for per-record modification in-flight.
//!
//! # Overview
//!
//! Processors modify single records as they flow from source to sink. They
//! can:
//! - Rewrite timestamps for replay scenarios
//! - Filter records by field equality
//! - Transform string field values
//! - Enrich records with static fields
//!
//! # Design Principles
//!
//! - **Fast**: Processors are pure CPU work and should add microseconds
//! - **Non-blocking**: Never block on I/O or external services
//! - **Thread-safe**: One chain instance is shared across all workers
//! - **Drop is not an error**: Filtering is expressed as an absent result,
//!   distinct from a processing failure
//!
//! # Architecture
//!
//! ```text
//! [Record] → [Processor 1] → [Processor 2] → ... → [Record']
//!                 │
//!                 └─ Ok(None)  → record dropped, chain stops
//!                 └─ Err(...)  → record failed, chain stops
//! ```
//!
//! Processors are chained together and applied in declared order. The
//! `Chain` struct handles sequencing, the drop sentinel, and error
//! propagation.
//!
//! # Adding a New Processor
//!
//! Each processor owns its config. Follow this pattern:
//!
//! 1. **Create a config struct** with builder helpers and validation:
//!
//! ```ignore
//! pub struct MyConfig {
//!     pub field_name: String,
//! }
//!
//! impl MyConfig {
//!     pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
//!         self.field_name = name.into();
//!         self
//!     }
//!
//!     pub fn validate(&self) -> Result<(), String> {
//!         if self.field_name.is_empty() { return Err("requires 'field_name'".into()); }
//!         Ok(())
//!     }
//! }
//! ```
//!
//! 2. **Implement `TryFrom<&ProcessorInstanceConfig>`** for YAML parsing:
//!
//! ```ignore
//! impl TryFrom<&ProcessorInstanceConfig> for MyConfig {
//!     type Error = String;
//!
//!     fn try_from(config: &ProcessorInstanceConfig) -> Result<Self, Self::Error> {
//!         let mut my_config = MyConfig::default();
//!
//!         if let Some(name) = config.get_str("field_name") {
//!             my_config.field_name = name.to_string();
//!         }
//!
//!         my_config.validate()?;
//!         Ok(my_config)
//!     }
//! }
//! ```
//!
//! 3. **Implement the `Processor` trait** on your processor struct.
//!
//! 4. **Register a factory in `create_default_registry()`**.
//!
//! # Modules
//!
//! - `chain` - Sequential processor execution
//! - `registry` - Dynamic processor creation from config
//! - `passthrough` - Pass-through processor for testing and wiring checks
//! - `timestamp_replay` - Timestamp rewriting for replay scenarios
//! - `drop` - Field-equality filtering
//! - `transform` - String field transformations
//! - `enrich` - Static field injection
//!
//! # Example
//!
//! ```ignore
//! use sluice_processor::{Chain, create_default_registry};
//!
//! let registry = create_default_registry();
//! let chain = Chain::from_configs(&registry, &config.processors)?;
//!
//! match chain.process(record)? {
//!     Some(record) => sink.send(record).await?,
//!     None => {} // dropped
//! }
//! ```

mod chain;
mod error;
pub mod drop;
pub mod enrich;
pub mod passthrough;
pub mod registry;
pub mod timestamp_replay;
pub mod transform;

pub use chain::Chain;
pub use drop::{DropConfig, DropFactory, DropProcessor};
pub use enrich::{EnrichConfig, EnrichFactory, EnrichProcessor};
pub use error::ProcessorError;
pub use passthrough::{PassthroughFactory, PassthroughProcessor};
pub use registry::{ProcessorFactory, ProcessorRegistry};
pub use timestamp_replay::{
    SUPPORTED_UNITS, TimestampReplayConfig, TimestampReplayFactory, TimestampReplayProcessor,
};
pub use transform::{TransformConfig, TransformFactory, TransformOperation, TransformProcessor};

use sluice_protocol::Record;

/// Result type for processor operations
pub type ProcessorResult<T> = Result<T, ProcessorError>;

/// Trait for record processors
///
/// Implementors must be `Send + Sync` to allow concurrent use across
/// worker tasks.
///
/// # Example
///
/// ```ignore
/// struct MyProcessor;
///
/// impl Processor for MyProcessor {
///     fn process(&self, record: Record) -> ProcessorResult<Option<Record>> {
///         Ok(Some(record))
///     }
///
///     fn name(&self) -> &'static str {
///         "my_processor"
///     }
/// }
/// ```
pub trait Processor: Send + Sync {
    /// Process a single record
    ///
    /// Returns `Ok(Some(record))` to continue the chain with the (possibly
    /// modified) record, `Ok(None)` to drop it silently, or an error to
    /// fail it. A failed record is reported with its provenance and never
    /// reaches the sink.
    fn process(&self, record: Record) -> ProcessorResult<Option<Record>>;

    /// Name of this processor for logging and error messages
    fn name(&self) -> &'static str;
}

impl std::fmt::Debug for dyn Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Create a default processor registry with all built-in processors
///
/// Includes:
/// - `passthrough` - Pass-through processor
/// - `timestamp_replay` - Timestamp rewriting for replay scenarios
/// - `drop` - Field-equality filtering
/// - `transform` - String field transformations
/// - `enrich` - Static field injection
pub fn create_default_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register("passthrough", PassthroughFactory);
    registry.register("timestamp_replay", TimestampReplayFactory);
    registry.register("drop", DropFactory);
    registry.register("transform", TransformFactory);
    registry.register("enrich", EnrichFactory);
    registry
}
