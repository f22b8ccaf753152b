//! Tests for PassthroughProcessor

use super::*;
use chrono::{TimeZone, Utc};
use serde_json::json;
use sluice_protocol::RecordBuilder;

fn create_test_record() -> Record {
    let mut fields = serde_json::Map::new();
    fields.insert("status".to_string(), json!("active"));
    fields.insert("count".to_string(), json!(7));

    RecordBuilder::new("events", 2, 99)
        .key(&b"k1"[..])
        .value(&br#"{"status":"active","count":7}"#[..])
        .timestamp(Utc.with_ymd_and_hms(2026, 1, 23, 10, 0, 0).unwrap())
        .value_fields(fields)
        .build()
}

#[test]
fn test_passthrough_returns_record_unchanged() {
    let processor = PassthroughProcessor::new();
    let record = create_test_record();

    let result = processor.process(record).unwrap();
    let forwarded = result.expect("record must not be dropped");

    assert_eq!(forwarded.topic(), "events");
    assert_eq!(forwarded.partition(), 2);
    assert_eq!(forwarded.offset(), 99);
    assert_eq!(forwarded.key().as_ref(), b"k1");
    assert_eq!(
        forwarded.timestamp(),
        Utc.with_ymd_and_hms(2026, 1, 23, 10, 0, 0).unwrap()
    );
    assert_eq!(forwarded.value_field("status"), Some(&json!("active")));
    assert_eq!(forwarded.value_field("count"), Some(&json!(7)));
}

#[test]
fn test_passthrough_name() {
    let processor = PassthroughProcessor::new();
    assert_eq!(processor.name(), "passthrough");
}

#[test]
fn test_passthrough_factory_ignores_options() {
    let config = ProcessorInstanceConfig::new("passthrough").with_option("ignored", "value");
    let processor = PassthroughFactory.create(&config).unwrap();
    assert_eq!(processor.name(), "passthrough");
}
