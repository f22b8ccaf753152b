//! Processor error types
//!
//! Errors that can occur while building a chain or processing a record.

use thiserror::Error;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Errors that can occur during processor construction or processing
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Invalid configuration (fails chain construction)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A record-level transformation failed (the pipeline continues)
    #[error("process failed in '{processor}': {message}")]
    ProcessFailed {
        /// Name of the failing processor
        processor: &'static str,
        /// What went wrong
        message: String,
    },

    /// A chain step could not be built, with its position for context
    #[error("processor {index} ({kind}): {source}")]
    ChainBuild {
        /// Zero-based position in the declared chain
        index: usize,
        /// Declared type tag
        kind: String,
        /// Underlying construction error
        #[source]
        source: Box<ProcessorError>,
    },
}

impl ProcessorError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a process failed error
    pub fn failed(processor: &'static str, msg: impl Into<String>) -> Self {
        Self::ProcessFailed {
            processor,
            message: msg.into(),
        }
    }

    /// Wrap a construction error with its chain position
    pub fn chain_build(index: usize, kind: impl Into<String>, source: ProcessorError) -> Self {
        Self::ChainBuild {
            index,
            kind: kind.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error aborts startup rather than one record
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::ChainBuild { .. })
    }
}
