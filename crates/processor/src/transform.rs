//! Transform Processor - string operations on a value field
//!
//! Applies one of four operations to a named string field: case folding or
//! affixing. A missing field or a non-string value leaves the record
//! unchanged without an error, so mixed-schema topics flow through cleanly.

use crate::{Processor, ProcessorError, ProcessorFactory, ProcessorResult};
use serde_json::Value;
use sluice_config::ProcessorInstanceConfig;
use sluice_protocol::Record;

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;

/// String operation applied to the target field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOperation {
    /// Uppercase the field value
    Uppercase,
    /// Lowercase the field value
    Lowercase,
    /// Prepend the configured prefix
    AddPrefix,
    /// Append the configured suffix
    AddSuffix,
}

impl TransformOperation {
    /// Parse an operation from its config name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uppercase" => Some(Self::Uppercase),
            "lowercase" => Some(Self::Lowercase),
            "add_prefix" => Some(Self::AddPrefix),
            "add_suffix" => Some(Self::AddSuffix),
            _ => None,
        }
    }

    /// Get the config name of this operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::AddPrefix => "add_prefix",
            Self::AddSuffix => "add_suffix",
        }
    }
}

/// Configuration for the transform processor
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Value field to rewrite
    pub field_name: String,
    /// Operation to apply
    pub operation: TransformOperation,
    /// Prefix text (required for add_prefix)
    pub prefix: Option<String>,
    /// Suffix text (required for add_suffix)
    pub suffix: Option<String>,
}

impl TransformConfig {
    /// Create a new config for the given field and operation
    pub fn new(field_name: impl Into<String>, operation: TransformOperation) -> Self {
        Self {
            field_name: field_name.into(),
            operation,
            prefix: None,
            suffix: None,
        }
    }

    /// Set the prefix text
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the suffix text
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.field_name.is_empty() {
            return Err("requires 'field_name' (string)".to_string());
        }
        if self.operation == TransformOperation::AddPrefix && self.prefix.is_none() {
            return Err("operation 'add_prefix' requires 'prefix'".to_string());
        }
        if self.operation == TransformOperation::AddSuffix && self.suffix.is_none() {
            return Err("operation 'add_suffix' requires 'suffix'".to_string());
        }
        Ok(())
    }
}

impl TryFrom<&ProcessorInstanceConfig> for TransformConfig {
    type Error = String;

    fn try_from(config: &ProcessorInstanceConfig) -> Result<Self, Self::Error> {
        let field_name = config
            .get_str("field_name")
            .ok_or("requires 'field_name' (string)")?;

        let operation_name = config
            .get_str("operation")
            .ok_or("requires 'operation' (string)")?;
        let operation = TransformOperation::parse(operation_name)
            .ok_or_else(|| format!("unknown operation '{operation_name}'"))?;

        let mut transform_config = TransformConfig::new(field_name, operation);

        if let Some(prefix) = config.get_str("prefix") {
            transform_config.prefix = Some(prefix.to_string());
        }
        if let Some(suffix) = config.get_str("suffix") {
            transform_config.suffix = Some(suffix.to_string());
        }

        transform_config.validate()?;
        Ok(transform_config)
    }
}

/// A processor that rewrites one string field in place
pub struct TransformProcessor {
    config: TransformConfig,
}

impl TransformProcessor {
    /// Create a new transform processor from a validated config
    pub fn new(config: TransformConfig) -> ProcessorResult<Self> {
        config.validate().map_err(ProcessorError::config)?;
        Ok(Self { config })
    }

    fn apply(&self, value: &str) -> String {
        match self.config.operation {
            TransformOperation::Uppercase => value.to_uppercase(),
            TransformOperation::Lowercase => value.to_lowercase(),
            TransformOperation::AddPrefix => {
                format!("{}{}", self.config.prefix.as_deref().unwrap_or_default(), value)
            }
            TransformOperation::AddSuffix => {
                format!("{}{}", value, self.config.suffix.as_deref().unwrap_or_default())
            }
        }
    }
}

impl Processor for TransformProcessor {
    fn process(&self, mut record: Record) -> ProcessorResult<Option<Record>> {
        let replaced = match record.value_field(&self.config.field_name) {
            Some(Value::String(current)) => self.apply(current),
            // Missing field or non-string value: forward unchanged
            _ => return Ok(Some(record)),
        };

        record.set_value_field(self.config.field_name.clone(), Value::String(replaced));
        Ok(Some(record))
    }

    fn name(&self) -> &'static str {
        "transform"
    }
}

/// Factory for TransformProcessor
pub struct TransformFactory;

impl ProcessorFactory for TransformFactory {
    fn create(&self, config: &ProcessorInstanceConfig) -> ProcessorResult<Box<dyn Processor>> {
        let transform_config =
            TransformConfig::try_from(config).map_err(ProcessorError::config)?;
        Ok(Box::new(TransformProcessor::new(transform_config)?))
    }

    fn name(&self) -> &'static str {
        "transform"
    }
}
