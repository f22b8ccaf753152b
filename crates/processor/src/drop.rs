//! Drop Processor - filters records by field equality
//!
//! Drops a record when a named value field holds exactly the configured
//! string. Dropping is ordinary filtering, not an error: the chain stops
//! and nothing reaches the sink, but no error is reported.

use crate::{Processor, ProcessorError, ProcessorFactory, ProcessorResult};
use serde_json::Value;
use sluice_config::ProcessorInstanceConfig;
use sluice_protocol::Record;

#[cfg(test)]
#[path = "drop_test.rs"]
mod tests;

/// Configuration for the drop processor
#[derive(Debug, Clone, Default)]
pub struct DropConfig {
    /// Value field to inspect
    pub field_name: String,
    /// String the field must equal for the record to be dropped
    pub filter_criteria: String,
}

impl DropConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field to inspect
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set the value that triggers the drop
    pub fn with_filter_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.filter_criteria = criteria.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.field_name.is_empty() {
            return Err("requires 'field_name' (string)".to_string());
        }
        if self.filter_criteria.is_empty() {
            return Err("requires 'filter_criteria' (string)".to_string());
        }
        Ok(())
    }
}

impl TryFrom<&ProcessorInstanceConfig> for DropConfig {
    type Error = String;

    fn try_from(config: &ProcessorInstanceConfig) -> Result<Self, Self::Error> {
        let mut drop_config = DropConfig::default();

        if let Some(name) = config.get_str("field_name") {
            drop_config.field_name = name.to_string();
        } else if config.has("field_name") {
            return Err("'field_name' must be a string".to_string());
        }

        if let Some(criteria) = config.get_str("filter_criteria") {
            drop_config.filter_criteria = criteria.to_string();
        } else if config.has("filter_criteria") {
            return Err("'filter_criteria' must be a string".to_string());
        }

        drop_config.validate()?;
        Ok(drop_config)
    }
}

/// A processor that drops records whose field equals the criteria
///
/// A missing field or a non-string value never drops: only an exact string
/// match does.
pub struct DropProcessor {
    config: DropConfig,
}

impl DropProcessor {
    /// Create a new drop processor from a validated config
    pub fn new(config: DropConfig) -> ProcessorResult<Self> {
        config.validate().map_err(ProcessorError::config)?;
        Ok(Self { config })
    }
}

impl Processor for DropProcessor {
    fn process(&self, record: Record) -> ProcessorResult<Option<Record>> {
        let matches = matches!(
            record.value_field(&self.config.field_name),
            Some(Value::String(s)) if *s == self.config.filter_criteria
        );

        if matches {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    }

    fn name(&self) -> &'static str {
        "drop"
    }
}

/// Factory for DropProcessor
pub struct DropFactory;

impl ProcessorFactory for DropFactory {
    fn create(&self, config: &ProcessorInstanceConfig) -> ProcessorResult<Box<dyn Processor>> {
        let drop_config = DropConfig::try_from(config).map_err(ProcessorError::config)?;
        Ok(Box::new(DropProcessor::new(drop_config)?))
    }

    fn name(&self) -> &'static str {
        "drop"
    }
}
