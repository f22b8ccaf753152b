//! Passthrough Processor - forwards records unchanged
//!
//! The `PassthroughProcessor` hands every record through untouched. It's
//! useful for:
//! - Testing the chain infrastructure
//! - Measuring pipeline overhead without transformation cost
//! - Replaying a topic verbatim

use crate::{Processor, ProcessorFactory, ProcessorResult};
use sluice_config::ProcessorInstanceConfig;
use sluice_protocol::Record;

#[cfg(test)]
#[path = "passthrough_test.rs"]
mod tests;

/// A processor that forwards records unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughProcessor;

impl PassthroughProcessor {
    /// Create a new passthrough processor
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

impl Processor for PassthroughProcessor {
    fn process(&self, record: Record) -> ProcessorResult<Option<Record>> {
        Ok(Some(record))
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Factory for PassthroughProcessor
pub struct PassthroughFactory;

impl ProcessorFactory for PassthroughFactory {
    fn create(&self, _config: &ProcessorInstanceConfig) -> ProcessorResult<Box<dyn Processor>> {
        Ok(Box::new(PassthroughProcessor::new()))
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
