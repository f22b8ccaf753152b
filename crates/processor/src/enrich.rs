//! Enrich Processor - adds a constant field to every record
//!
//! Sets a named value field to a configured constant, overwriting any
//! existing value. The constant may be any YAML value (string, number,
//! boolean, list, mapping, null).

use crate::{Processor, ProcessorError, ProcessorFactory, ProcessorResult};
use serde_json::Value;
use sluice_config::ProcessorInstanceConfig;
use sluice_protocol::Record;

#[cfg(test)]
#[path = "enrich_test.rs"]
mod tests;

/// Configuration for the enrich processor
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Value field to set
    pub field_name: String,
    /// Constant written into the field
    pub field_value: Value,
}

impl EnrichConfig {
    /// Create a new config setting the given field to the given value
    pub fn new(field_name: impl Into<String>, field_value: Value) -> Self {
        Self {
            field_name: field_name.into(),
            field_value,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.field_name.is_empty() {
            return Err("requires 'field_name' (string)".to_string());
        }
        Ok(())
    }
}

impl TryFrom<&ProcessorInstanceConfig> for EnrichConfig {
    type Error = String;

    fn try_from(config: &ProcessorInstanceConfig) -> Result<Self, Self::Error> {
        let field_name = config
            .get_str("field_name")
            .ok_or("requires 'field_name' (string)")?;

        let raw_value = config.get("field_value").ok_or("requires 'field_value'")?;
        let field_value = serde_json::to_value(raw_value)
            .map_err(|e| format!("'field_value' is not representable as JSON: {e}"))?;

        let enrich_config = EnrichConfig::new(field_name, field_value);
        enrich_config.validate()?;
        Ok(enrich_config)
    }
}

/// A processor that writes a constant into one value field
pub struct EnrichProcessor {
    config: EnrichConfig,
}

impl EnrichProcessor {
    /// Create a new enrich processor from a validated config
    pub fn new(config: EnrichConfig) -> ProcessorResult<Self> {
        config.validate().map_err(ProcessorError::config)?;
        Ok(Self { config })
    }
}

impl Processor for EnrichProcessor {
    fn process(&self, mut record: Record) -> ProcessorResult<Option<Record>> {
        record.set_value_field(
            self.config.field_name.clone(),
            self.config.field_value.clone(),
        );
        Ok(Some(record))
    }

    fn name(&self) -> &'static str {
        "enrich"
    }
}

/// Factory for EnrichProcessor
pub struct EnrichFactory;

impl ProcessorFactory for EnrichFactory {
    fn create(&self, config: &ProcessorInstanceConfig) -> ProcessorResult<Box<dyn Processor>> {
        let enrich_config = EnrichConfig::try_from(config).map_err(ProcessorError::config)?;
        Ok(Box::new(EnrichProcessor::new(enrich_config)?))
    }

    fn name(&self) -> &'static str {
        "enrich"
    }
}
