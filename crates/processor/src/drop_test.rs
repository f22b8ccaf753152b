//! Tests for DropProcessor

use super::*;
use serde_json::json;
use sluice_protocol::RecordBuilder;

fn create_record_with_status(status: serde_json::Value) -> Record {
    let mut fields = serde_json::Map::new();
    fields.insert("status".to_string(), status);
    fields.insert("user_id".to_string(), json!("u-1"));

    RecordBuilder::new("events", 0, 10)
        .value_fields(fields)
        .build()
}

fn inactive_dropper() -> DropProcessor {
    let config = DropConfig::new()
        .with_field_name("status")
        .with_filter_criteria("inactive");
    DropProcessor::new(config).unwrap()
}

#[test]
fn test_drop_on_exact_match() {
    let processor = inactive_dropper();
    let record = create_record_with_status(json!("inactive"));

    let result = processor.process(record).unwrap();

    assert!(result.is_none());
}

#[test]
fn test_keep_on_different_value() {
    let processor = inactive_dropper();
    let record = create_record_with_status(json!("active"));

    let result = processor.process(record).unwrap();

    let kept = result.expect("record must be kept");
    assert_eq!(kept.value_field("status"), Some(&json!("active")));
}

#[test]
fn test_keep_on_missing_field() {
    let processor = inactive_dropper();
    let record = RecordBuilder::new("events", 0, 10).build();

    let result = processor.process(record).unwrap();

    assert!(result.is_some());
}

#[test]
fn test_keep_on_non_string_field() {
    let processor = inactive_dropper();
    let record = create_record_with_status(json!(42));

    let result = processor.process(record).unwrap();

    let kept = result.expect("non-string field must not drop");
    assert_eq!(kept.value_field("status"), Some(&json!(42)));
}

#[test]
fn test_drop_name() {
    assert_eq!(inactive_dropper().name(), "drop");
}

// =============================================================================
// Configuration tests
// =============================================================================

#[test]
fn test_config_requires_field_name() {
    let config = ProcessorInstanceConfig::new("drop").with_option("filter_criteria", "inactive");
    let err = DropConfig::try_from(&config).unwrap_err();
    assert!(err.contains("field_name"));
}

#[test]
fn test_config_requires_filter_criteria() {
    let config = ProcessorInstanceConfig::new("drop").with_option("field_name", "status");
    let err = DropConfig::try_from(&config).unwrap_err();
    assert!(err.contains("filter_criteria"));
}

#[test]
fn test_config_rejects_non_string_field_name() {
    let config = ProcessorInstanceConfig::new("drop")
        .with_option("field_name", 5)
        .with_option("filter_criteria", "inactive");
    let err = DropConfig::try_from(&config).unwrap_err();
    assert_eq!(err, "'field_name' must be a string");
}

#[test]
fn test_config_rejects_non_string_criteria() {
    let config = ProcessorInstanceConfig::new("drop")
        .with_option("field_name", "status")
        .with_option("filter_criteria", false);
    let err = DropConfig::try_from(&config).unwrap_err();
    assert_eq!(err, "'filter_criteria' must be a string");
}

#[test]
fn test_factory_builds_from_valid_options() {
    let config = ProcessorInstanceConfig::new("drop")
        .with_option("field_name", "status")
        .with_option("filter_criteria", "inactive");

    let processor = DropFactory.create(&config).unwrap();
    assert_eq!(processor.name(), "drop");

    let record = create_record_with_status(json!("inactive"));
    assert!(processor.process(record).unwrap().is_none());
}

#[test]
fn test_factory_rejects_missing_options() {
    let config = ProcessorInstanceConfig::new("drop");
    let err = DropFactory.create(&config).unwrap_err();
    assert!(matches!(err, ProcessorError::Config(_)));
}
