//! Timestamp Replay Processor - rewrites record timestamps
//!
//! Replaces a record's timestamp either with a fixed instant or with the
//! record's own timestamp shifted by a signed number of units. Mode
//! selection is fixed at construction; parsing the instant and resolving
//! the unit name happen per record and fail that record only.

use chrono::{DateTime, Duration, Months, Utc};
use sluice_config::ProcessorInstanceConfig;
use sluice_protocol::Record;

use crate::{Processor, ProcessorError, ProcessorFactory, ProcessorResult};

#[cfg(test)]
#[path = "timestamp_replay_test.rs"]
mod tests;

const NAME: &str = "timestamp_replay";

/// Duration units accepted for the `unit` key
pub const SUPPORTED_UNITS: [&str; 9] = [
    "microseconds",
    "milliseconds",
    "seconds",
    "minutes",
    "hours",
    "days",
    "weeks",
    "months",
    "years",
];

/// Configuration for the timestamp replay processor
///
/// Exactly one mode must be chosen: `target_timestamp` alone, or `offset`
/// together with `unit`.
#[derive(Debug, Clone, Default)]
pub struct TimestampReplayConfig {
    /// RFC 3339 instant that replaces every record's timestamp
    pub target_timestamp: Option<String>,
    /// Signed shift applied to the record's own timestamp
    pub offset: Option<i64>,
    /// Unit the shift is expressed in, one of [`SUPPORTED_UNITS`]
    pub unit: Option<String>,
}

impl TimestampReplayConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fixed instant to stamp onto every record
    pub fn with_target_timestamp(mut self, target: impl Into<String>) -> Self {
        self.target_timestamp = Some(target.into());
        self
    }

    /// Set the signed shift
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the unit of the shift
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Validate mode selection without parsing the instant or the unit
    pub fn validate(&self) -> Result<(), String> {
        match (&self.target_timestamp, self.offset, &self.unit) {
            (Some(_), Some(_), _) => {
                Err("'target_timestamp' and 'offset' are mutually exclusive".to_string())
            }
            (Some(_), None, Some(_)) => {
                Err("'target_timestamp' and 'unit' are mutually exclusive".to_string())
            }
            (None, None, _) => {
                Err("requires either 'target_timestamp' or 'offset' with 'unit'".to_string())
            }
            (None, Some(_), None) => Err("'offset' requires 'unit'".to_string()),
            (Some(target), None, None) if target.is_empty() => {
                Err("'target_timestamp' must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl TryFrom<&ProcessorInstanceConfig> for TimestampReplayConfig {
    type Error = String;

    fn try_from(config: &ProcessorInstanceConfig) -> Result<Self, Self::Error> {
        let mut replay_config = TimestampReplayConfig::default();

        if config.has("target_timestamp") {
            let target = config
                .get_str("target_timestamp")
                .ok_or("'target_timestamp' must be a string")?;
            replay_config.target_timestamp = Some(target.to_string());
        }

        if config.has("offset") {
            let offset = config.get_int("offset").ok_or("'offset' must be an integer")?;
            replay_config.offset = Some(offset);
        }

        if config.has("unit") {
            let unit = config.get_str("unit").ok_or("'unit' must be a string")?;
            replay_config.unit = Some(unit.to_string());
        }

        replay_config.validate()?;
        Ok(replay_config)
    }
}

/// A processor that replays records at a different point in time
pub struct TimestampReplayProcessor {
    config: TimestampReplayConfig,
}

impl TimestampReplayProcessor {
    /// Create a new timestamp replay processor from a validated config
    pub fn new(config: TimestampReplayConfig) -> ProcessorResult<Self> {
        config.validate().map_err(ProcessorError::config)?;
        Ok(Self { config })
    }
}

impl Processor for TimestampReplayProcessor {
    fn process(&self, mut record: Record) -> ProcessorResult<Option<Record>> {
        let replayed = match &self.config.target_timestamp {
            Some(raw) => parse_instant(raw)?,
            None => {
                let offset = self.config.offset.unwrap_or_default();
                let unit = self.config.unit.as_deref().unwrap_or_default();
                shift(record.timestamp(), offset, unit)?
            }
        };

        record.set_timestamp(replayed);
        Ok(Some(record))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

fn parse_instant(raw: &str) -> ProcessorResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| {
            ProcessorError::failed(NAME, format!("invalid target_timestamp '{raw}': {e}"))
        })
}

fn shift(instant: DateTime<Utc>, offset: i64, unit: &str) -> ProcessorResult<DateTime<Utc>> {
    let shifted = match unit {
        "microseconds" => instant.checked_add_signed(Duration::microseconds(offset)),
        "milliseconds" => {
            Duration::try_milliseconds(offset).and_then(|d| instant.checked_add_signed(d))
        }
        "seconds" => Duration::try_seconds(offset).and_then(|d| instant.checked_add_signed(d)),
        "minutes" => Duration::try_minutes(offset).and_then(|d| instant.checked_add_signed(d)),
        "hours" => Duration::try_hours(offset).and_then(|d| instant.checked_add_signed(d)),
        "days" => Duration::try_days(offset).and_then(|d| instant.checked_add_signed(d)),
        "weeks" => Duration::try_weeks(offset).and_then(|d| instant.checked_add_signed(d)),
        "months" => shift_months(instant, offset),
        "years" => offset
            .checked_mul(12)
            .and_then(|months| shift_months(instant, months)),
        other => {
            return Err(ProcessorError::failed(
                NAME,
                format!(
                    "unknown duration unit '{}', supported: [{}]",
                    other,
                    SUPPORTED_UNITS.join(", ")
                ),
            ));
        }
    };

    shifted.ok_or_else(|| {
        ProcessorError::failed(NAME, format!("shifting by {offset} {unit} overflows"))
    })
}

/// Calendar-aware month arithmetic. Clamps to the last valid day of the
/// landing month, so Jan 31 + 1 month is Feb 28 (or 29).
fn shift_months(instant: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let magnitude = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        instant.checked_add_months(Months::new(magnitude))
    } else {
        instant.checked_sub_months(Months::new(magnitude))
    }
}

/// Factory for TimestampReplayProcessor
pub struct TimestampReplayFactory;

impl ProcessorFactory for TimestampReplayFactory {
    fn create(&self, config: &ProcessorInstanceConfig) -> ProcessorResult<Box<dyn Processor>> {
        let replay_config =
            TimestampReplayConfig::try_from(config).map_err(ProcessorError::config)?;
        Ok(Box::new(TimestampReplayProcessor::new(replay_config)?))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
