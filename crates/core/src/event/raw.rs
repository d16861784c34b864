//! Raw events: arbitrary bytes with optional metadata

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{FieldValue, Fields, Tags};
use crate::error::EventError;

/// Arbitrary bytes received from some source, plus tags and fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    ts: DateTime<Utc>,
    tags: Tags,
    fields: Fields,
    source: String,
    value: Vec<u8>,
}

impl Raw {
    /// Construct a raw event. Tag entries with an empty key are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when `source` is empty.
    pub fn new(
        source: &str,
        value: &[u8],
        tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        if source.is_empty() {
            return Err(EventError::MissingRawSource);
        }

        let mut out = Raw {
            ts,
            tags: Tags::new(),
            fields,
            source: source.to_string(),
            value: value.to_vec(),
        };
        for (k, v) in tags {
            if k.is_empty() {
                continue;
            }
            out.tags.insert(k, v);
        }
        Ok(out)
    }

    /// The source this event originated from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The content received for the event.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Observation timestamp.
    pub fn time(&self) -> DateTime<Utc> {
        self.ts
    }

    /// Tag map.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Field map.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Whether a tag is present.
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Add or replace a tag.
    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    /// Remove a tag.
    pub fn remove_tag(&mut self, key: &str) {
        self.tags.remove(key);
    }

    /// Whether a field is present.
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Add or replace a field.
    pub fn add_field(&mut self, key: &str, value: FieldValue) {
        self.fields.insert(key.to_string(), value);
    }

    /// Remove a field.
    pub fn remove_field(&mut self, key: &str) {
        self.fields.remove(key);
    }

    /// The payload bytes when present, otherwise a JSON object describing
    /// the event.
    pub fn serialize(&self) -> Vec<u8> {
        if !self.value.is_empty() {
            return self.value.clone();
        }
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), field_value_json(v)))
            .collect();
        let obj = json!({
            "timestamp": self.ts.to_rfc3339(),
            "source": self.source,
            "tags": self.tags,
            "fields": fields,
        });
        serde_json::to_vec(&obj).unwrap_or_default()
    }
}

fn field_value_json(v: &FieldValue) -> serde_json::Value {
    match v {
        FieldValue::Int(i) => json!(i),
        FieldValue::Float(f) => json!(f),
        FieldValue::Bool(b) => json!(b),
        FieldValue::Str(s) => json!(s),
        FieldValue::Bytes(b) => json!(String::from_utf8_lossy(b)),
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}
