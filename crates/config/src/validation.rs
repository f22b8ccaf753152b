//! Configuration validation
//!
//! Validates config consistency beyond what deserialization enforces:
//! - Required string/list fields are non-empty
//! - Schema-registry formats carry a registry URL
//! - Numeric values are within their legal ranges
//! - Partition lists contain no negative partition
//!
//! Processor options are deliberately not checked here; the typed
//! per-variant configs validate them when the chain is built.

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::input::InputConfig;
use crate::output::{BATCH_SIZE_RANGE, OutputConfig};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_input(&config.input)?;
    validate_output(&config.output)?;
    Ok(())
}

/// Validate the input section
fn validate_input(input: &InputConfig) -> Result<()> {
    if input.brokers.is_empty() {
        return Err(ConfigError::missing_field("input", "brokers"));
    }
    if input.brokers.iter().any(String::is_empty) {
        return Err(ConfigError::invalid_value(
            "input",
            "brokers",
            "broker address must not be empty",
        ));
    }
    if input.topic.is_empty() {
        return Err(ConfigError::missing_field("input", "topic"));
    }
    if input.consumer_group_id.is_empty() {
        return Err(ConfigError::missing_field("input", "consumer_group_id"));
    }
    if input.workers == 0 {
        return Err(ConfigError::invalid_value(
            "input",
            "workers",
            "must be at least 1",
        ));
    }
    validate_schema_registry("input", input.format.requires_schema_registry(), input.schema_registry_url.as_deref())?;
    if input.min_bytes == 0 {
        return Err(ConfigError::invalid_value(
            "input",
            "min_bytes",
            "must be at least 1",
        ));
    }
    if input.max_bytes < input.min_bytes {
        return Err(ConfigError::invalid_value(
            "input",
            "max_bytes",
            format!("must be >= min_bytes ({})", input.min_bytes),
        ));
    }
    if input.max_wait_time == 0 {
        return Err(ConfigError::invalid_value(
            "input",
            "max_wait_time",
            "must be at least 1 millisecond",
        ));
    }
    if input.heartbeat_interval >= input.session_timeout {
        return Err(ConfigError::invalid_value(
            "input",
            "heartbeat_interval",
            "must be shorter than session_timeout",
        ));
    }
    validate_partitions("input", input.partitions.as_deref())?;
    Ok(())
}

/// Validate the output section
fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.brokers.is_empty() {
        return Err(ConfigError::missing_field("output", "brokers"));
    }
    if output.brokers.iter().any(String::is_empty) {
        return Err(ConfigError::invalid_value(
            "output",
            "brokers",
            "broker address must not be empty",
        ));
    }
    if output.topic.is_empty() {
        return Err(ConfigError::missing_field("output", "topic"));
    }
    if output.workers == 0 {
        return Err(ConfigError::invalid_value(
            "output",
            "workers",
            "must be at least 1",
        ));
    }
    validate_schema_registry("output", output.format.requires_schema_registry(), output.schema_registry_url.as_deref())?;
    if !BATCH_SIZE_RANGE.contains(&output.batch_size) {
        return Err(ConfigError::invalid_value(
            "output",
            "batch_size",
            format!(
                "must be between {} and {}, got {}",
                BATCH_SIZE_RANGE.start(),
                BATCH_SIZE_RANGE.end(),
                output.batch_size
            ),
        ));
    }
    validate_partitions("output", output.partitions.as_deref())?;
    Ok(())
}

/// Formats backed by a schema registry must name one
fn validate_schema_registry(
    section: &'static str,
    required: bool,
    url: Option<&str>,
) -> Result<()> {
    if required && url.is_none_or(str::is_empty) {
        return Err(ConfigError::missing_field(section, "schema_registry_url"));
    }
    Ok(())
}

/// Partition ids are non-negative
fn validate_partitions(section: &'static str, partitions: Option<&[i32]>) -> Result<()> {
    if let Some(parts) = partitions
        && let Some(bad) = parts.iter().find(|p| **p < 0)
    {
        return Err(ConfigError::invalid_value(
            section,
            "partitions",
            format!("partition {bad} is negative"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::Config;
    use std::str::FromStr;

    fn base_config(input_extra: &str, output_extra: &str) -> String {
        format!(
            r#"
input:
  brokers: ["localhost:9092"]
  topic: events
  format: json
{input_extra}
output:
  type: kafka
  brokers: ["localhost:9092"]
  topic: events-out
  format: json
{output_extra}
"#
        )
    }

    #[test]
    fn test_valid_minimal_config() {
        let yaml = base_config("", "");
        assert!(Config::from_str(&yaml).is_ok());
    }

    #[test]
    fn test_empty_input_brokers() {
        let yaml = r#"
input:
  brokers: []
  topic: events
  format: json
output:
  type: kafka
  brokers: ["localhost:9092"]
  topic: events-out
  format: json
"#;
        let err = Config::from_str(yaml).unwrap_err();
        assert_eq!(err.to_string(), "input is missing required field 'brokers'");
    }

    #[test]
    fn test_blank_broker_address() {
        let yaml = r#"
input:
  brokers: ["localhost:9092", ""]
  topic: events
  format: json
output:
  type: kafka
  brokers: ["localhost:9092"]
  topic: events-out
  format: json
"#;
        let err = Config::from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("broker address must not be empty"));
    }

    #[test]
    fn test_zero_workers() {
        let yaml = base_config("  workers: 0", "");
        let err = Config::from_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("workers"));
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_avro_requires_schema_registry() {
        let yaml = r#"
input:
  brokers: ["localhost:9092"]
  topic: events
  format: avro
output:
  type: kafka
  brokers: ["localhost:9092"]
  topic: events-out
  format: json
"#;
        let err = Config::from_str(yaml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "input is missing required field 'schema_registry_url'"
        );
    }

    #[test]
    fn test_avro_with_schema_registry_is_valid() {
        let yaml = r#"
input:
  brokers: ["localhost:9092"]
  topic: events
  format: avro
  schema_registry_url: "http://localhost:8081"
output:
  type: kafka
  brokers: ["localhost:9092"]
  topic: events-out
  format: json
"#;
        assert!(Config::from_str(yaml).is_ok());
    }

    #[test]
    fn test_protobuf_output_requires_schema_registry() {
        let yaml = r#"
input:
  brokers: ["localhost:9092"]
  topic: events
  format: json
output:
  type: kafka
  brokers: ["localhost:9092"]
  topic: events-out
  format: protobuf
"#;
        let err = Config::from_str(yaml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "output is missing required field 'schema_registry_url'"
        );
    }

    #[test]
    fn test_batch_size_zero_is_rejected() {
        let yaml = base_config("", "  batch_size: 0");
        let err = Config::from_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
        assert!(err.to_string().contains("between 1 and 100000"));
    }

    #[test]
    fn test_batch_size_too_large_is_rejected() {
        let yaml = base_config("", "  batch_size: 100001");
        let err = Config::from_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("got 100001"));
    }

    #[test]
    fn test_batch_size_bounds_are_inclusive() {
        assert!(Config::from_str(&base_config("", "  batch_size: 1")).is_ok());
        assert!(Config::from_str(&base_config("", "  batch_size: 100000")).is_ok());
    }

    #[test]
    fn test_max_bytes_below_min_bytes() {
        let yaml = base_config("  min_bytes: 4096\n  max_bytes: 1024", "");
        let err = Config::from_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("max_bytes"));
        assert!(err.to_string().contains("min_bytes (4096)"));
    }

    #[test]
    fn test_heartbeat_must_be_shorter_than_session() {
        let yaml = base_config("  session_timeout: 3s\n  heartbeat_interval: 3s", "");
        let err = Config::from_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("heartbeat_interval"));
        assert!(err.to_string().contains("session_timeout"));
    }

    #[test]
    fn test_negative_partition_rejected() {
        let yaml = base_config("  partitions: [0, -1]", "");
        let err = Config::from_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("partition -1 is negative"));
    }

    #[test]
    fn test_negative_output_partition_rejected() {
        let yaml = base_config("", "  partitions: [-3]");
        let err = Config::from_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("output"));
        assert!(err.to_string().contains("partition -3 is negative"));
    }
}
