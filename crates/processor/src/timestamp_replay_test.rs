//! Tests for TimestampReplayProcessor

use super::*;
use sluice_protocol::RecordBuilder;

fn instant(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

fn record_at(raw: &str) -> Record {
    RecordBuilder::new("events", 0, 1)
        .timestamp(instant(raw))
        .build()
}

// =============================================================================
// Fixed-instant mode
// =============================================================================

#[test]
fn test_target_timestamp_overwrites() {
    let config = TimestampReplayConfig::new().with_target_timestamp("2026-01-23T10:00:00Z");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let result = p.process(record_at("2020-06-01T00:00:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2026-01-23T10:00:00Z"));
}

#[test]
fn test_target_timestamp_normalizes_timezone() {
    let config = TimestampReplayConfig::new().with_target_timestamp("2026-01-23T10:00:00+02:00");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let result = p.process(record_at("2020-06-01T00:00:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2026-01-23T08:00:00Z"));
}

#[test]
fn test_unparsable_target_fails_the_record() {
    let config = TimestampReplayConfig::new().with_target_timestamp("not-a-timestamp");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let err = p.process(record_at("2020-06-01T00:00:00Z")).unwrap_err();

    assert!(!err.is_fatal());
    assert!(err.to_string().contains("invalid target_timestamp"));
}

// =============================================================================
// Offset mode
// =============================================================================

#[test]
fn test_offset_adds_seconds() {
    let config = TimestampReplayConfig::new().with_offset(60).with_unit("seconds");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let result = p.process(record_at("2026-01-23T10:00:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2026-01-23T10:01:00Z"));
}

#[test]
fn test_negative_offset_subtracts() {
    let config = TimestampReplayConfig::new().with_offset(-30).with_unit("seconds");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let result = p.process(record_at("2026-01-23T10:00:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2026-01-23T09:59:30Z"));
}

#[test]
fn test_fixed_width_units() {
    let base = "2026-01-23T10:00:00Z";
    let cases = [
        (1_500_000, "microseconds", "2026-01-23T10:00:01.500Z"),
        (250, "milliseconds", "2026-01-23T10:00:00.250Z"),
        (5, "minutes", "2026-01-23T10:05:00Z"),
        (2, "hours", "2026-01-23T12:00:00Z"),
        (3, "days", "2026-01-26T10:00:00Z"),
        (1, "weeks", "2026-01-30T10:00:00Z"),
    ];

    for (offset, unit, expected) in cases {
        let config = TimestampReplayConfig::new().with_offset(offset).with_unit(unit);
        let p = TimestampReplayProcessor::new(config).unwrap();
        let result = p.process(record_at(base)).unwrap().unwrap();
        assert_eq!(result.timestamp(), instant(expected), "unit {unit}");
    }
}

#[test]
fn test_months_clamp_to_month_end() {
    let config = TimestampReplayConfig::new().with_offset(1).with_unit("months");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let result = p.process(record_at("2026-01-31T12:00:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2026-02-28T12:00:00Z"));
}

#[test]
fn test_negative_months() {
    let config = TimestampReplayConfig::new().with_offset(-2).with_unit("months");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let result = p.process(record_at("2026-03-15T08:30:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2026-01-15T08:30:00Z"));
}

#[test]
fn test_years_respect_leap_days() {
    let config = TimestampReplayConfig::new().with_offset(1).with_unit("years");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let result = p.process(record_at("2024-02-29T00:00:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2025-02-28T00:00:00Z"));
}

#[test]
fn test_unknown_unit_fails_the_record() {
    let config = TimestampReplayConfig::new().with_offset(1).with_unit("bogus");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let err = p.process(record_at("2026-01-23T10:00:00Z")).unwrap_err();

    assert!(!err.is_fatal());
    let message = err.to_string();
    assert!(message.contains("unknown duration unit 'bogus'"));
    assert!(message.contains("months"));
}

#[test]
fn test_overflowing_shift_fails_the_record() {
    let config = TimestampReplayConfig::new().with_offset(i64::MAX).with_unit("days");
    let p = TimestampReplayProcessor::new(config).unwrap();

    let err = p.process(record_at("2026-01-23T10:00:00Z")).unwrap_err();

    assert!(!err.is_fatal());
    assert!(err.to_string().contains("overflows"));
}

// =============================================================================
// Configuration tests
// =============================================================================

#[test]
fn test_config_rejects_both_modes() {
    let config = TimestampReplayConfig::new()
        .with_target_timestamp("2026-01-23T10:00:00Z")
        .with_offset(60)
        .with_unit("seconds");

    let err = config.validate().unwrap_err();
    assert!(err.contains("mutually exclusive"));
}

#[test]
fn test_config_rejects_neither_mode() {
    let err = TimestampReplayConfig::new().validate().unwrap_err();
    assert!(err.contains("requires either"));
}

#[test]
fn test_config_rejects_offset_without_unit() {
    let err = TimestampReplayConfig::new().with_offset(60).validate().unwrap_err();
    assert_eq!(err, "'offset' requires 'unit'");
}

#[test]
fn test_config_rejects_target_with_unit() {
    let config = TimestampReplayConfig::new()
        .with_target_timestamp("2026-01-23T10:00:00Z")
        .with_unit("seconds");

    let err = config.validate().unwrap_err();
    assert!(err.contains("mutually exclusive"));
}

#[test]
fn test_config_rejects_empty_target() {
    let err = TimestampReplayConfig::new()
        .with_target_timestamp("")
        .validate()
        .unwrap_err();
    assert!(err.contains("must not be empty"));
}

#[test]
fn test_config_does_not_resolve_unit_eagerly() {
    // Unit names resolve per record; an unknown one still constructs.
    let config = TimestampReplayConfig::new().with_offset(1).with_unit("fortnights");
    assert!(config.validate().is_ok());
    assert!(TimestampReplayProcessor::new(config).is_ok());
}

#[test]
fn test_try_from_instance_config() {
    let config = ProcessorInstanceConfig::new("timestamp_replay")
        .with_option("offset", -45)
        .with_option("unit", "minutes");

    let replay_config = TimestampReplayConfig::try_from(&config).unwrap();

    assert_eq!(replay_config.target_timestamp, None);
    assert_eq!(replay_config.offset, Some(-45));
    assert_eq!(replay_config.unit.as_deref(), Some("minutes"));
}

#[test]
fn test_try_from_rejects_wrong_types() {
    let config = ProcessorInstanceConfig::new("timestamp_replay")
        .with_option("offset", "sixty")
        .with_option("unit", "seconds");

    let err = TimestampReplayConfig::try_from(&config).unwrap_err();
    assert_eq!(err, "'offset' must be an integer");
}

#[test]
fn test_factory_builds_working_processor() {
    let config = ProcessorInstanceConfig::new("timestamp_replay")
        .with_option("target_timestamp", "2026-01-23T10:00:00Z");

    let p = TimestampReplayFactory.create(&config).unwrap();
    let result = p.process(record_at("2020-06-01T00:00:00Z")).unwrap().unwrap();

    assert_eq!(result.timestamp(), instant("2026-01-23T10:00:00Z"));
    assert_eq!(p.name(), "timestamp_replay");
}

#[test]
fn test_factory_rejects_invalid_mode() {
    let config = ProcessorInstanceConfig::new("timestamp_replay").with_option("offset", 60);

    let err = TimestampReplayFactory.create(&config).unwrap_err();
    assert!(matches!(err, ProcessorError::Config(_)));
    assert!(err.is_fatal());
}
