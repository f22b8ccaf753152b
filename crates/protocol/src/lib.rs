//! Sluice Protocol - core record types for the sluice pipeline
//!
//! This crate provides the foundational types that flow through the pipeline:
//! - `Record` - one consumed message with provenance and decoded field views
//! - `RecordBuilder` - incremental construction used by sources
//! - `PayloadFormat` - wire format of key/value payloads
//! - `Deserializer` - payload-to-field-map decoding
//!
//! # Design Principles
//!
//! - **Cheap clones**: raw payloads use `bytes::Bytes`, so cloning a record
//!   shares the underlying buffers
//! - **Decode once**: the source decodes `value_fields` before a record is
//!   published; processors never touch raw bytes
//! - **Immutable provenance**: topic, partition and offset never change
//!   after construction

mod error;
mod format;
mod record;

pub use error::ProtocolError;
pub use format::{Deserializer, PayloadFormat};
pub use record::{Record, RecordBuilder};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Field name that carries the payload of plain-string records
pub const TEXT_MESSAGE_FIELD: &str = "message";
