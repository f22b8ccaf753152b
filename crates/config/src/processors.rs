//! Processor configuration
//!
//! Each entry in the `processors` list declares one chain step: a type tag
//! plus type-specific options. The raw form here is converted into a typed
//! per-variant config when the chain is built, so option errors surface
//! before the pipeline starts.
//!
//! # Example
//!
//! ```yaml
//! processors:
//!   - type: drop
//!     config:
//!       field_name: status
//!       filter_criteria: inactive
//!   - type: transform
//!     config:
//!       field_name: message
//!       operation: uppercase
//! ```

use serde::Deserialize;
use std::collections::HashMap;

/// Configuration for a single processor instance
///
/// The type tag determines which processor is constructed; `options` holds
/// the type-specific keys under `config:` in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorInstanceConfig {
    /// Processor type (e.g., "passthrough", "transform")
    #[serde(rename = "type")]
    pub processor_type: String,

    /// Type-specific options, consumed by the processor's typed config
    #[serde(default, rename = "config")]
    pub options: HashMap<String, serde_yaml::Value>,
}

impl ProcessorInstanceConfig {
    /// Create a config with the given type tag and no options
    pub fn new(processor_type: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            options: HashMap::new(),
        }
    }

    /// Add an option (builder style, used by tests and defaults)
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get a raw option value
    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.options.get(key)
    }

    /// Get an option as string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Get an option as i64
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_i64())
    }

    /// Get an option as f64
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.options.get(key).and_then(|v| v.as_f64())
    }

    /// Get an option as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// Check if an option is present
    pub fn has(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }
}
