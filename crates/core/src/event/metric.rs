//! Metric events
//!
//! A metric is a name, tag map, timestamp, and one or more fields holding
//! point-in-time values. Names, tag keys, and field keys are sanitized on
//! construction; tag entries with an empty key or value are dropped.

use std::fmt;

use chrono::{DateTime, Utc};

use super::sanitize::{
    escape_field_value, metric_name_valid, sanitize_name, sanitize_name_prefix,
    sanitize_name_suffix, sanitize_tag_key,
};
use super::{FieldValue, Fields, Tags};
use crate::error::EventError;

/// The kind of value a metric represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// Monotonically increasing value
    Counter,
    /// Point-in-time value that can go up or down
    Gauge,
    /// No declared semantics
    Untyped,
    /// Sampled distribution
    Histogram,
    /// Pre-aggregated distribution
    Summary,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricType::Counter => f.write_str("counter"),
            MetricType::Gauge => f.write_str("gauge"),
            MetricType::Untyped => f.write_str("untyped"),
            MetricType::Histogram => f.write_str("histogram"),
            MetricType::Summary => f.write_str("summary"),
        }
    }
}

/// A named, typed measurement with tags and one or more fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    ts: DateTime<Utc>,
    tags: Tags,
    fields: Fields,
    name: String,
    metric_type: MetricType,
}

impl Metric {
    /// Construct a metric, sanitizing the name, tag keys, and field keys.
    ///
    /// # Errors
    ///
    /// - the name is empty or fails `[a-zA-Z][a-zA-Z0-9_:]*`
    /// - the field map is empty
    /// - a field key fails the metric name grammar
    pub fn new(
        name: &str,
        tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
        metric_type: MetricType,
    ) -> Result<Self, EventError> {
        if name.is_empty() {
            return Err(EventError::MissingMetricName);
        }
        if fields.is_empty() {
            return Err(EventError::NoFields { name: name.to_string() });
        }
        if !metric_name_valid(name) {
            return Err(EventError::InvalidMetricName { name: name.to_string() });
        }
        for key in fields.keys() {
            if !metric_name_valid(key) {
                return Err(EventError::InvalidFieldKey {
                    name: name.to_string(),
                    key: key.clone(),
                });
            }
        }

        let mut out = Metric {
            ts,
            tags: Tags::new(),
            fields: Fields::new(),
            name: sanitize_name(name),
            metric_type,
        };

        for (k, v) in tags {
            if k.is_empty() || v.is_empty() {
                continue;
            }
            out.tags.insert(sanitize_tag_key(&k), v);
        }
        for (k, v) in fields {
            out.fields.insert(sanitize_name(&k), v);
        }

        Ok(out)
    }

    /// Construct a metric from already-validated parts, skipping
    /// sanitization. Used by codecs and the self-metric registry, whose
    /// inputs are produced by `serialize` or by the registry itself.
    pub fn parsed(
        name: &str,
        tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
        metric_type: MetricType,
    ) -> Self {
        Metric {
            ts,
            tags,
            fields,
            name: name.to_string(),
            metric_type,
        }
    }

    /// The metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared metric kind.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Replace the name (sanitized).
    pub fn set_name(&mut self, name: &str) {
        self.name = sanitize_name(name);
    }

    /// Prepend a prefix to the name. Only the prefix's first character is
    /// sanitized; the rest is taken as given.
    pub fn set_prefix(&mut self, prefix: &str) {
        self.name = format!("{}{}", sanitize_name_prefix(prefix), self.name);
    }

    /// Append a suffix to the name, sanitized with the body grammar.
    pub fn set_suffix(&mut self, suffix: &str) {
        self.name = format!("{}{}", self.name, sanitize_name_suffix(suffix));
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

    /// Whether the (sanitized) tag key is present.
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(&sanitize_tag_key(key))
    }

    /// Add or replace a tag under the sanitized key.
    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.tags.insert(sanitize_tag_key(key), value.to_string());
    }

    /// Remove the (sanitized) tag key.
    pub fn remove_tag(&mut self, key: &str) {
        self.tags.remove(&sanitize_tag_key(key));
    }

    /// Whether the (sanitized) field key is present.
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(&sanitize_name(key))
    }

    /// Add or replace a field under the sanitized key.
    pub fn add_field(&mut self, key: &str, value: FieldValue) {
        self.fields.insert(sanitize_name(key), value);
    }

    /// Remove the (sanitized) field key.
    pub fn remove_field(&mut self, key: &str) {
        self.fields.remove(&sanitize_name(key));
    }

    /// Split into one metric per field, all sharing the timestamp and tags.
    /// A single-field metric splits into itself.
    pub fn split(&self) -> Vec<Metric> {
        if self.fields.len() == 1 {
            return vec![self.clone()];
        }
        self.fields
            .iter()
            .map(|(k, v)| {
                let mut fields = Fields::new();
                fields.insert(k.clone(), v.clone());
                Metric {
                    ts: self.ts,
                    tags: self.tags.clone(),
                    fields,
                    name: self.name.clone(),
                    metric_type: self.metric_type,
                }
            })
            .collect()
    }

    /// Serialize into the line protocol:
    /// `name[,tagK=tagV]* fieldK=fieldV[ fieldK=fieldV]* <unix_nanos>`.
    ///
    /// Integers carry a trailing `i`; strings are double-quoted with `"`
    /// and `\` escaped; bytes are emitted verbatim.
    pub fn serialize(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(64);
        b.extend_from_slice(self.name.as_bytes());
        for (k, v) in &self.tags {
            b.push(b',');
            b.extend_from_slice(k.as_bytes());
            b.push(b'=');
            b.extend_from_slice(v.as_bytes());
        }
        b.push(b' ');
        for (k, v) in &self.fields {
            b.extend_from_slice(k.as_bytes());
            b.push(b'=');
            append_field_value(&mut b, v);
            b.push(b' ');
        }
        let nanos = self.ts.timestamp_nanos_opt().unwrap_or(0);
        b.extend_from_slice(nanos.to_string().as_bytes());
        b
    }
}

fn append_field_value(b: &mut Vec<u8>, value: &FieldValue) {
    match value {
        FieldValue::Float(v) => b.extend_from_slice(format_float(*v).as_bytes()),
        FieldValue::Int(v) => {
            b.extend_from_slice(v.to_string().as_bytes());
            b.push(b'i');
        }
        FieldValue::Str(s) => {
            b.push(b'"');
            b.extend_from_slice(escape_field_value(s).as_bytes());
            b.push(b'"');
        }
        FieldValue::Bool(v) => b.extend_from_slice(if *v { b"true" } else { b"false" }),
        FieldValue::Bytes(v) => b.extend_from_slice(v),
    }
}

// Shortest representation without an exponent, matching the historical
// wire format for values like `101` and `0.25`.
fn format_float(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}

#[cfg(test)]
#[path = "metric_test.rs"]
mod metric_test;
