//! Sluice Configuration
//!
//! YAML-based configuration loading with eager validation: a config either
//! loads completely or fails with a descriptive error before anything starts.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use sluice_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(r#"
//! input:
//!   brokers: ["localhost:9092"]
//!   topic: events
//!   format: json
//! output:
//!   type: kafka
//!   brokers: ["localhost:9092"]
//!   topic: events-out
//!   format: json
//! "#).unwrap();
//! assert_eq!(config.input.topic, "events");
//! ```
//!
//! # Example Full Config
//!
//! See `configs/example.yml` for all available options.

mod error;
mod input;
mod logging;
mod output;
mod processors;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use input::{InputConfig, OffsetReset};
pub use logging::{LogConfig, LogLevel};
pub use output::{BATCH_SIZE_RANGE, Compression, OutputConfig, OutputType};
pub use processors::ProcessorInstanceConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// `input` and `output` are required sections; the processor list and the
/// log section default to empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Consumed side of the pipeline
    pub input: InputConfig,

    /// Ordered processor chain (may be empty)
    #[serde(default)]
    pub processors: Vec<ProcessorInstanceConfig>,

    /// Produced side of the pipeline
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid YAML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a YAML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks that required fields are non-empty, numeric values are within
    /// range and schema-registry formats name a registry URL.
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
