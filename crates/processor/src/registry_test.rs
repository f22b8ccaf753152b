//! Tests for the processor registry

use super::*;
use crate::passthrough::PassthroughFactory;
use crate::create_default_registry;
use sluice_protocol::RecordBuilder;

#[test]
fn test_new_registry_is_empty() {
    let registry = ProcessorRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.available_types().is_empty());
}

#[test]
fn test_register_and_create() {
    let mut registry = ProcessorRegistry::new();
    registry.register("passthrough", PassthroughFactory);

    assert!(registry.contains("passthrough"));
    assert_eq!(registry.len(), 1);

    let config = ProcessorInstanceConfig::new("passthrough");
    let processor = registry.create(&config).unwrap();
    assert_eq!(processor.name(), "passthrough");

    let record = RecordBuilder::new("events", 0, 1).build();
    assert!(processor.process(record).unwrap().is_some());
}

#[test]
fn test_create_unknown_type() {
    let registry = create_default_registry();
    let config = ProcessorInstanceConfig::new("resample");

    let err = registry.create(&config).unwrap_err();

    assert!(err.is_fatal());
    let message = err.to_string();
    assert!(message.contains("unknown processor type 'resample'"), "got: {message}");
    // The hint lists the registered types so typos are easy to spot.
    assert!(
        message.contains("[drop, enrich, passthrough, timestamp_replay, transform]"),
        "got: {message}"
    );
}

#[test]
fn test_create_propagates_factory_errors() {
    let registry = create_default_registry();
    let config = ProcessorInstanceConfig::new("drop");

    let err = registry.create(&config).unwrap_err();
    assert!(matches!(err, ProcessorError::Config(_)));
}

#[test]
#[should_panic(expected = "already registered")]
fn test_register_duplicate_panics() {
    let mut registry = ProcessorRegistry::new();
    registry.register("passthrough", PassthroughFactory);
    registry.register("passthrough", PassthroughFactory);
}

#[test]
fn test_available_types_sorted() {
    let registry = create_default_registry();
    assert_eq!(
        registry.available_types(),
        vec!["drop", "enrich", "passthrough", "timestamp_replay", "transform"]
    );
}

#[test]
fn test_default_registry_covers_all_builtins() {
    let registry = create_default_registry();
    assert_eq!(registry.len(), 5);

    for type_name in ["passthrough", "timestamp_replay", "drop", "transform", "enrich"] {
        assert!(registry.contains(type_name), "missing {type_name}");
    }
}
