//! Record - the unit of data flowing through the pipeline
//!
//! A `Record` wraps one message consumed from a partitioned log: the raw
//! key/value payloads, provenance (topic, partition, offset), broker
//! metadata, and the decoded field views that processors operate on.
//!
//! # Design
//!
//! - `key` and `value` use `bytes::Bytes` so cloning a record never copies
//!   the raw payloads
//! - `value_fields` is the mutable working view; it is populated from
//!   `value` before the record is handed to any processor
//! - `key_fields` is decoded best-effort and may be empty (plain-string
//!   keys are common)
//! - provenance fields are immutable after construction

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One message in flight through the pipeline
#[derive(Debug, Clone)]
pub struct Record {
    /// Raw key payload as received from the broker
    key: Bytes,

    /// Raw value payload as received from the broker
    value: Bytes,

    /// Topic the record was consumed from
    topic: String,

    /// Partition within the topic
    partition: i32,

    /// Partition-local offset, monotonically increasing
    offset: i64,

    /// Record timestamp; processors may rewrite it
    timestamp: DateTime<Utc>,

    /// Broker headers, forwarded to the sink unchanged
    headers: HashMap<String, String>,

    /// Decoded key fields (best-effort, may be empty)
    key_fields: Map<String, Value>,

    /// Decoded value fields - the view processors read and mutate
    value_fields: Map<String, Value>,
}

impl Record {
    /// Get the raw key payload
    #[inline]
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Get the raw value payload
    #[inline]
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Get the source topic
    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Get the source partition
    #[inline]
    pub fn partition(&self) -> i32 {
        self.partition
    }

    /// Get the partition-local offset
    #[inline]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Get the record timestamp
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Overwrite the record timestamp
    #[inline]
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    /// Get the broker headers
    #[inline]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get the decoded key fields
    #[inline]
    pub fn key_fields(&self) -> &Map<String, Value> {
        &self.key_fields
    }

    /// Get the decoded value fields
    #[inline]
    pub fn value_fields(&self) -> &Map<String, Value> {
        &self.value_fields
    }

    /// Look up a single value field by name
    #[inline]
    pub fn value_field(&self, name: &str) -> Option<&Value> {
        self.value_fields.get(name)
    }

    /// Set a value field, overwriting any existing entry
    #[inline]
    pub fn set_value_field(&mut self, name: impl Into<String>, value: Value) {
        self.value_fields.insert(name.into(), value);
    }

    /// Number of decoded value fields
    #[inline]
    pub fn field_count(&self) -> usize {
        self.value_fields.len()
    }
}

/// Builder for constructing records
///
/// Used by sources to assemble a record from a consumed broker message.
/// Provenance is required up front; everything else has a neutral default
/// so tests can build minimal records.
pub struct RecordBuilder {
    key: Bytes,
    value: Bytes,
    topic: String,
    partition: i32,
    offset: i64,
    timestamp: DateTime<Utc>,
    headers: HashMap<String, String>,
    key_fields: Map<String, Value>,
    value_fields: Map<String, Value>,
}

impl RecordBuilder {
    /// Create a builder with the record's provenance
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            key: Bytes::new(),
            value: Bytes::new(),
            topic: topic.into(),
            partition,
            offset,
            timestamp: Utc::now(),
            headers: HashMap::new(),
            key_fields: Map::new(),
            value_fields: Map::new(),
        }
    }

    /// Set the raw key payload
    pub fn key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the raw value payload
    pub fn value(mut self, value: impl Into<Bytes>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the record timestamp
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the broker headers
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Set the decoded key fields
    pub fn key_fields(mut self, fields: Map<String, Value>) -> Self {
        self.key_fields = fields;
        self
    }

    /// Set the decoded value fields
    pub fn value_fields(mut self, fields: Map<String, Value>) -> Self {
        self.value_fields = fields;
        self
    }

    /// Produce the finished record
    pub fn build(self) -> Record {
        Record {
            key: self.key,
            value: self.value,
            topic: self.topic,
            partition: self.partition,
            offset: self.offset,
            timestamp: self.timestamp,
            headers: self.headers,
            key_fields: self.key_fields,
            value_fields: self.value_fields,
        }
    }
}
