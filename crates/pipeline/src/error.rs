//! Pipeline error types
//!
//! Construction failures from any stage abort startup; runtime task
//! failures surface after the shutdown sequence has completed.

use sluice_processor::ProcessorError;
use sluice_sinks::SinkError;
use sluice_sources::SourceError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The processor chain could not be built
    #[error("failed to build processor chain: {0}")]
    Chain(#[from] ProcessorError),

    /// The source failed to construct or stopped abnormally
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The sink failed to construct or to close
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// A pipeline task ended without running to completion
    #[error("{task} task terminated abnormally: {message}")]
    Task {
        /// Which task went down
        task: &'static str,
        /// Join failure description
        message: String,
    },
}

impl PipelineError {
    /// Create a task failure error
    pub fn task(task: &'static str, message: impl Into<String>) -> Self {
        Self::Task {
            task,
            message: message.into(),
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
