//! Processor Chain - Sequential record transformation
//!
//! The `Chain` applies multiple processors in declared order to records
//! flowing through the pipeline.
//!
//! # Design
//!
//! - **Strictly ordered**: each processor receives the output of the
//!   previous one
//! - **Fail-fast**: the first error stops the chain for that record; the
//!   caller reports it with the record's provenance
//! - **Drop sentinel**: a processor returning no record ends the chain
//!   without an error; the record is counted as dropped, not failed
//! - **Shared**: one immutable chain instance serves all workers

use crate::{Processor, ProcessorError, ProcessorResult, ProcessorRegistry};
use sluice_config::ProcessorInstanceConfig;
use sluice_protocol::Record;

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;

/// Chain of processors applied sequentially
#[derive(Debug)]
pub struct Chain {
    /// Ordered list of processors
    processors: Vec<Box<dyn Processor>>,
}

impl Chain {
    /// Create a chain from already-constructed processors
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Create an empty chain (records pass through untouched)
    pub fn empty() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Build a chain from declared configurations
    ///
    /// Processors are constructed in declared order through the given
    /// registry. The first invalid entry fails the whole build with its
    /// chain position attached.
    pub fn from_configs(
        registry: &ProcessorRegistry,
        configs: &[ProcessorInstanceConfig],
    ) -> ProcessorResult<Self> {
        let mut processors = Vec::with_capacity(configs.len());

        for (index, config) in configs.iter().enumerate() {
            let processor = registry
                .create(config)
                .map_err(|e| ProcessorError::chain_build(index, &config.processor_type, e))?;
            processors.push(processor);
        }

        Ok(Self::new(processors))
    }

    /// Get the number of processors
    #[inline]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if the chain is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Get the names of all processors in order
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Run a record through all processors in sequence
    ///
    /// Returns `Ok(None)` when a processor drops the record; no later
    /// processor runs in that case. Returns the first error unchanged; the
    /// record is not forwarded then.
    pub fn process(&self, record: Record) -> ProcessorResult<Option<Record>> {
        let mut current = record;

        for processor in &self.processors {
            match processor.process(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        Ok(Some(current))
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::empty()
    }
}
