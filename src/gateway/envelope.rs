//! Response envelope decoding
//!
//! The remote responder returns rows either as a bare JSON array or wrapped
//! in an object under `rows`, `data`, or `result`. Anything else is opaque
//! and decodes to no rows. Decoding never fails.

use serde_json::Value;
use tracing::warn;

use crate::types::Row;

/// Envelope keys in lookup priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKey {
    Rows,
    Data,
    Result,
}

impl EnvelopeKey {
    pub const PRIORITY: [EnvelopeKey; 3] = [Self::Rows, Self::Data, Self::Result];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rows => "rows",
            Self::Data => "data",
            Self::Result => "result",
        }
    }
}

/// Decoded response shape
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Payload is the row sequence itself
    Bare(Vec<Value>),
    /// Payload is an object; rows live under `key`
    Keyed { key: EnvelopeKey, value: Value },
    /// Unrecognized payload
    Opaque,
}

impl Envelope {
    /// Classify a decoded payload. For keyed objects the first non-null key in
    /// `EnvelopeKey::PRIORITY` wins.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Bare(items),
            Value::Object(mut obj) => EnvelopeKey::PRIORITY
                .into_iter()
                .find_map(|key| match obj.remove(key.as_str()) {
                    Some(Value::Null) | None => None,
                    Some(value) => Some(Self::Keyed { key, value }),
                })
                .unwrap_or(Self::Opaque),
            _ => Self::Opaque,
        }
    }

    /// Extract rows. Elements that are not objects are skipped; a keyed value
    /// that is not an array yields no rows.
    pub fn into_rows(self) -> Vec<Row> {
        let items = match self {
            Self::Bare(items) => items,
            Self::Keyed {
                value: Value::Array(items),
                ..
            } => items,
            Self::Keyed { key, .. } => {
                warn!(key = key.as_str(), "envelope key does not hold an array");
                return Vec::new();
            }
            Self::Opaque => return Vec::new(),
        };

        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect()
    }
}

/// Parse a response body into a JSON value.
///
/// Primary parse is plain JSON. On failure a best-effort secondary parse strips
/// a UTF-8 BOM and any prefix before the first `[` or `{`. A payload that
/// decodes to a JSON string is parsed once more (double-encoded bodies).
pub fn decode_body(body: &str) -> Option<Value> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(primary) => match lenient_parse(body) {
            Some(value) => value,
            None => {
                warn!(error = %primary, "response body is not JSON, treating as empty");
                return None;
            }
        },
    };

    match value {
        Value::String(inner) => match serde_json::from_str::<Value>(&inner) {
            Ok(nested @ (Value::Array(_) | Value::Object(_))) => Some(nested),
            _ => Some(Value::String(inner)),
        },
        other => Some(other),
    }
}

fn lenient_parse(body: &str) -> Option<Value> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    let start = trimmed.find(['[', '{'])?;
    serde_json::from_str(&trimmed[start..]).ok()
}

/// Decode a raw response body all the way to rows
pub fn decode_rows(body: &str) -> Vec<Row> {
    decode_body(body)
        .map(|value| Envelope::from_value(value).into_rows())
        .unwrap_or_default()
}
