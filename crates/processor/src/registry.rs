//! Processor Registry - Dynamic processor creation
//!
//! The registry maps processor type names to factory implementations,
//! enabling configuration-driven processor instantiation.
//!
//! # Design
//!
//! - **Compile-time extensibility**: Users implement `ProcessorFactory`
//! - **Type-safe**: Factories return `Box<dyn Processor>`
//! - **Explicit**: a registry is an ordinary value built at startup and
//!   passed to the chain builder; there is no global registration
//!
//! # Example
//!
//! ```ignore
//! let mut registry = ProcessorRegistry::new();
//! registry.register("passthrough", PassthroughFactory);
//!
//! // From config
//! let processor = registry.create(&instance_config)?;
//! ```

use crate::{Processor, ProcessorError, ProcessorResult};
use sluice_config::ProcessorInstanceConfig;
use std::collections::HashMap;

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// Factory trait for creating processors
///
/// Implement this trait to register custom processors with the registry.
pub trait ProcessorFactory: Send + Sync {
    /// Create a processor instance from its declared configuration
    ///
    /// # Errors
    /// Returns `ProcessorError::Config` if the options are invalid.
    fn create(&self, config: &ProcessorInstanceConfig) -> ProcessorResult<Box<dyn Processor>>;

    /// Human-readable name for this factory (for error messages)
    fn name(&self) -> &'static str;
}

/// Registry for processor factories
///
/// Maps processor type names (e.g., "passthrough", "transform") to their
/// factory implementations.
pub struct ProcessorRegistry {
    factories: HashMap<String, Box<dyn ProcessorFactory>>,
}

impl ProcessorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a processor factory
    ///
    /// # Panics
    /// Panics if a factory is already registered with this name.
    pub fn register<F: ProcessorFactory + 'static>(&mut self, type_name: &str, factory: F) {
        if self.factories.contains_key(type_name) {
            panic!("processor factory '{}' already registered", type_name);
        }
        self.factories
            .insert(type_name.to_string(), Box::new(factory));
    }

    /// Create a processor from its declared configuration
    ///
    /// # Errors
    /// - `ProcessorError::Config` if the type tag is not registered
    /// - `ProcessorError::Config` if the factory rejects the options
    pub fn create(&self, config: &ProcessorInstanceConfig) -> ProcessorResult<Box<dyn Processor>> {
        let factory = self
            .factories
            .get(config.processor_type.as_str())
            .ok_or_else(|| {
                ProcessorError::config(format!(
                    "unknown processor type '{}', available: [{}]",
                    config.processor_type,
                    self.available_types().join(", ")
                ))
            })?;

        factory.create(config)
    }

    /// Check if a processor type is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Get a sorted list of registered processor types
    pub fn available_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    /// Get the number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
