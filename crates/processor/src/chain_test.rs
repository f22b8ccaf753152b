//! Tests for the processor chain

use super::*;
use crate::drop::{DropConfig, DropProcessor};
use crate::enrich::{EnrichConfig, EnrichProcessor};
use crate::timestamp_replay::{TimestampReplayConfig, TimestampReplayProcessor};
use crate::transform::{TransformConfig, TransformOperation, TransformProcessor};
use crate::create_default_registry;
use serde_json::json;
use sluice_protocol::RecordBuilder;

fn create_test_record() -> Record {
    let mut fields = serde_json::Map::new();
    fields.insert("message".to_string(), json!("hello"));
    fields.insert("status".to_string(), json!("active"));

    RecordBuilder::new("events", 0, 42).value_fields(fields).build()
}

fn uppercase() -> Box<dyn Processor> {
    let config = TransformConfig::new("message", TransformOperation::Uppercase);
    Box::new(TransformProcessor::new(config).unwrap())
}

fn add_prefix(prefix: &str) -> Box<dyn Processor> {
    let config =
        TransformConfig::new("message", TransformOperation::AddPrefix).with_prefix(prefix);
    Box::new(TransformProcessor::new(config).unwrap())
}

fn drop_active() -> Box<dyn Processor> {
    let config = DropConfig::new()
        .with_field_name("status")
        .with_filter_criteria("active");
    Box::new(DropProcessor::new(config).unwrap())
}

fn enrich_seen() -> Box<dyn Processor> {
    Box::new(EnrichProcessor::new(EnrichConfig::new("seen", json!(true))).unwrap())
}

// =============================================================================
// Processing
// =============================================================================

#[test]
fn test_empty_chain_passes_through() {
    let chain = Chain::empty();
    assert!(chain.is_empty());
    assert_eq!(chain.len(), 0);

    let result = chain.process(create_test_record()).unwrap().unwrap();
    assert_eq!(result.value_field("message"), Some(&json!("hello")));
    assert_eq!(result.offset(), 42);
}

#[test]
fn test_single_processor() {
    let chain = Chain::new(vec![uppercase()]);

    let result = chain.process(create_test_record()).unwrap().unwrap();
    assert_eq!(result.value_field("message"), Some(&json!("HELLO")));
}

#[test]
fn test_processors_run_in_declared_order() {
    // prefix then uppercase: the prefix gets uppercased too
    let chain = Chain::new(vec![add_prefix("x_"), uppercase()]);
    let result = chain.process(create_test_record()).unwrap().unwrap();
    assert_eq!(result.value_field("message"), Some(&json!("X_HELLO")));

    // uppercase then prefix: the prefix stays as written
    let chain = Chain::new(vec![uppercase(), add_prefix("x_")]);
    let result = chain.process(create_test_record()).unwrap().unwrap();
    assert_eq!(result.value_field("message"), Some(&json!("x_HELLO")));
}

#[test]
fn test_drop_stops_the_chain() {
    let chain = Chain::new(vec![drop_active(), enrich_seen()]);

    // Matching record is dropped; the enrich step never runs.
    assert!(chain.process(create_test_record()).unwrap().is_none());

    // Non-matching record flows through to the enrich step.
    let mut fields = serde_json::Map::new();
    fields.insert("status".to_string(), json!("inactive"));
    let surviving = RecordBuilder::new("events", 0, 43).value_fields(fields).build();

    let result = chain.process(surviving).unwrap().unwrap();
    assert_eq!(result.value_field("seen"), Some(&json!(true)));
}

#[test]
fn test_error_stops_the_chain() {
    let replay_config = TimestampReplayConfig::new().with_offset(1).with_unit("bogus");
    let failing = Box::new(TimestampReplayProcessor::new(replay_config).unwrap());

    let chain = Chain::new(vec![failing, enrich_seen()]);
    let err = chain.process(create_test_record()).unwrap_err();

    assert!(matches!(err, ProcessorError::ProcessFailed { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn test_names_in_order() {
    let chain = Chain::new(vec![uppercase(), drop_active(), enrich_seen()]);
    assert_eq!(chain.names(), vec!["transform", "drop", "enrich"]);
}

#[test]
fn test_default_is_empty() {
    assert!(Chain::default().is_empty());
}

// =============================================================================
// Building from configuration
// =============================================================================

#[test]
fn test_from_configs_builds_in_order() {
    let registry = create_default_registry();
    let configs = vec![
        ProcessorInstanceConfig::new("passthrough"),
        ProcessorInstanceConfig::new("transform")
            .with_option("field_name", "message")
            .with_option("operation", "uppercase"),
    ];

    let chain = Chain::from_configs(&registry, &configs).unwrap();
    assert_eq!(chain.names(), vec!["passthrough", "transform"]);

    let result = chain.process(create_test_record()).unwrap().unwrap();
    assert_eq!(result.value_field("message"), Some(&json!("HELLO")));
}

#[test]
fn test_from_configs_empty_list() {
    let registry = create_default_registry();
    let chain = Chain::from_configs(&registry, &[]).unwrap();
    assert!(chain.is_empty());
}

#[test]
fn test_from_configs_parsed_from_yaml() {
    let yaml = r#"
- type: timestamp_replay
  config:
    offset: -1
    unit: hours
- type: drop
  config:
    field_name: status
    filter_criteria: active
- type: enrich
  config:
    field_name: replayed
    field_value: true
"#;
    let configs: Vec<ProcessorInstanceConfig> = serde_yaml::from_str(yaml).unwrap();
    let registry = create_default_registry();

    let chain = Chain::from_configs(&registry, &configs).unwrap();
    assert_eq!(chain.names(), vec!["timestamp_replay", "drop", "enrich"]);

    // status=active is dropped before the enrich step
    assert!(chain.process(create_test_record()).unwrap().is_none());
}

#[test]
fn test_from_configs_unknown_type_reports_position() {
    let registry = create_default_registry();
    let configs = vec![
        ProcessorInstanceConfig::new("passthrough"),
        ProcessorInstanceConfig::new("nope"),
    ];

    let err = Chain::from_configs(&registry, &configs).unwrap_err();

    assert!(err.is_fatal());
    let message = err.to_string();
    assert!(message.contains("processor 1 (nope)"), "got: {message}");
    assert!(message.contains("unknown processor type 'nope'"), "got: {message}");
}

#[test]
fn test_from_configs_invalid_options_report_position() {
    let registry = create_default_registry();
    let configs = vec![
        ProcessorInstanceConfig::new("drop").with_option("field_name", "status"),
    ];

    let err = Chain::from_configs(&registry, &configs).unwrap_err();

    assert!(matches!(err, ProcessorError::ChainBuild { index: 0, .. }));
    assert!(err.to_string().contains("filter_criteria"));
}
