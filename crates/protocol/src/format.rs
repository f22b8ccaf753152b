//! Payload formats and decoding
//!
//! `PayloadFormat` names the wire encoding of key/value payloads as declared
//! in configuration. `Deserializer` turns a raw payload into the field map
//! that processors operate on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::ProtocolError;
use crate::{Result, TEXT_MESSAGE_FIELD};

/// Wire format of a record's key and value payloads
///
/// `Avro` and `Protobuf` are accepted by configuration (they require a
/// schema registry URL) but this build carries no schema decoder for them,
/// so constructing a `Deserializer` with either fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// JSON object payloads
    Json,
    /// Avro with schema registry (not decodable in this build)
    Avro,
    /// Protobuf with schema registry (not decodable in this build)
    Protobuf,
    /// Opaque text; decoded into a single `message` field
    #[serde(rename = "string")]
    Text,
}

impl PayloadFormat {
    /// Check if this format can be decoded by this build
    #[inline]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Json | Self::Text)
    }

    /// Check if this format requires a schema registry URL
    #[inline]
    pub const fn requires_schema_registry(self) -> bool {
        matches!(self, Self::Avro | Self::Protobuf)
    }

    /// Get the string name of this format
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Avro => "avro",
            Self::Protobuf => "protobuf",
            Self::Text => "string",
        }
    }
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "avro" => Ok(Self::Avro),
            "protobuf" => Ok(Self::Protobuf),
            "string" => Ok(Self::Text),
            _ => Err(format!("unknown payload format: {s}")),
        }
    }
}

/// Decodes raw payloads into field maps per the configured format
#[derive(Debug, Clone, Copy)]
pub struct Deserializer {
    format: PayloadFormat,
}

impl Deserializer {
    /// Create a deserializer for the given format
    ///
    /// Fails for formats this build cannot decode.
    pub fn new(format: PayloadFormat) -> Result<Self> {
        if !format.is_supported() {
            return Err(ProtocolError::unsupported_format(format.as_str()));
        }
        Ok(Self { format })
    }

    /// Get the configured format
    #[inline]
    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    /// Decode a raw value payload into its field map
    ///
    /// For `Json` the payload must be a non-empty JSON object. For `Text`
    /// the payload becomes a single `message` field (lossy UTF-8).
    pub fn deserialize(&self, raw: &[u8]) -> Result<Map<String, Value>> {
        match self.format {
            PayloadFormat::Json => decode_json(raw),
            PayloadFormat::Text => Ok(decode_text(raw)),
            PayloadFormat::Avro | PayloadFormat::Protobuf => {
                Err(ProtocolError::unsupported_format(self.format.as_str()))
            }
        }
    }
}

fn decode_json(raw: &[u8]) -> Result<Map<String, Value>> {
    if raw.is_empty() {
        return Err(ProtocolError::EmptyPayload);
    }
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| ProtocolError::invalid_json(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ProtocolError::not_an_object(json_type_name(&other))),
    }
}

fn decode_text(raw: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        TEXT_MESSAGE_FIELD.to_string(),
        Value::String(String::from_utf8_lossy(raw).into_owned()),
    );
    map
}

/// JSON type name for error messages
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
