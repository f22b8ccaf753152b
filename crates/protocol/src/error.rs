//! Protocol error types
//!
//! Errors that can occur while decoding raw payloads into records.

use thiserror::Error;

/// Errors that can occur during payload decoding
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON
    #[error("invalid json payload: {0}")]
    InvalidJson(String),

    /// Payload decoded, but the top-level value is not an object
    #[error("json payload is not an object: got {0}")]
    NotAnObject(&'static str),

    /// Format requires a schema decoder this build does not carry
    #[error("unsupported payload format: {0}")]
    UnsupportedFormat(&'static str),

    /// Empty value payload (broker tombstone)
    #[error("empty value payload")]
    EmptyPayload,
}

impl ProtocolError {
    /// Create an invalid json error
    #[inline]
    pub fn invalid_json(msg: impl Into<String>) -> Self {
        Self::InvalidJson(msg.into())
    }

    /// Create a not-an-object error
    #[inline]
    pub fn not_an_object(kind: &'static str) -> Self {
        Self::NotAnObject(kind)
    }

    /// Create an unsupported format error
    #[inline]
    pub fn unsupported_format(format: &'static str) -> Self {
        Self::UnsupportedFormat(format)
    }
}
