//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Validation error - required field missing or empty
    #[error("{section} is missing required field '{field}'")]
    MissingField {
        /// Config section ("input", "output", ...)
        section: &'static str,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{section} has invalid {field}: {message}")]
    InvalidValue {
        /// Config section
        section: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(section: &'static str, field: &'static str) -> Self {
        Self::MissingField { section, field }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("input", "topic");
        assert_eq!(err.to_string(), "input is missing required field 'topic'");
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value(
            "output",
            "batch_size",
            "must be between 1 and 100000, got 0",
        );
        assert!(err.to_string().contains("output"));
        assert!(err.to_string().contains("batch_size"));
        assert!(err.to_string().contains("100000"));
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = ConfigError::IoError {
            path: "/etc/sluice/config.yml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("/etc/sluice/config.yml"));
    }
}
