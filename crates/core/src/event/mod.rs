//! The Optic event model
//!
//! An [`Event`] is the unit of telemetry flowing through the pipeline. It is
//! a sum of three variants behind a common capability surface: the core
//! pipeline is variant-agnostic, only codecs and the test accumulator branch
//! on the concrete kind.
//!
//! Cloning an event is a deep copy: tag and field maps own their storage, so
//! mutating a clone never affects the original. This is what makes the
//! fan-out contract of the forward function sound.

mod logline;
mod metric;
mod raw;
pub(crate) mod sanitize;
mod value;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

pub use logline::LogLine;
pub use metric::{Metric, MetricType};
pub use raw::Raw;
pub use sanitize::metric_name_valid;
pub use value::FieldValue;

/// Tag map: string keys to string values, sorted for deterministic output.
pub type Tags = BTreeMap<String, String>;

/// Field map: string keys to scalar values, sorted for deterministic output.
pub type Fields = BTreeMap<String, FieldValue>;

/// Discriminant of the event sum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Arbitrary bytes with optional metadata
    Raw,
    /// Named, typed numeric measurement
    Metric,
    /// Unstructured text line plus metadata
    LogLine,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Raw => f.write_str("raw"),
            EventType::Metric => f.write_str("metric"),
            EventType::LogLine => f.write_str("logline"),
        }
    }
}

/// The central Optic datastructure.
///
/// Goes through source / processor / sink operations regardless of variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// See [`Raw`]
    Raw(Raw),
    /// See [`Metric`]
    Metric(Metric),
    /// See [`LogLine`]
    LogLine(LogLine),
}

impl Event {
    /// The variant of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Raw(_) => EventType::Raw,
            Event::Metric(_) => EventType::Metric,
            Event::LogLine(_) => EventType::LogLine,
        }
    }

    /// Observation timestamp.
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Event::Raw(r) => r.time(),
            Event::Metric(m) => m.time(),
            Event::LogLine(l) => l.time(),
        }
    }

    /// Tag map of this event.
    pub fn tags(&self) -> &Tags {
        match self {
            Event::Raw(r) => r.tags(),
            Event::Metric(m) => m.tags(),
            Event::LogLine(l) => l.tags(),
        }
    }

    /// Field map of this event.
    pub fn fields(&self) -> &Fields {
        match self {
            Event::Raw(r) => r.fields(),
            Event::Metric(m) => m.fields(),
            Event::LogLine(l) => l.fields(),
        }
    }

    /// Whether a tag is present. Metric keys are sanitized before lookup.
    pub fn has_tag(&self, key: &str) -> bool {
        match self {
            Event::Raw(r) => r.has_tag(key),
            Event::Metric(m) => m.has_tag(key),
            Event::LogLine(l) => l.has_tag(key),
        }
    }

    /// Add or replace a tag. Metric keys are sanitized.
    pub fn add_tag(&mut self, key: &str, value: &str) {
        match self {
            Event::Raw(r) => r.add_tag(key, value),
            Event::Metric(m) => m.add_tag(key, value),
            Event::LogLine(l) => l.add_tag(key, value),
        }
    }

    /// Remove a tag if present.
    pub fn remove_tag(&mut self, key: &str) {
        match self {
            Event::Raw(r) => r.remove_tag(key),
            Event::Metric(m) => m.remove_tag(key),
            Event::LogLine(l) => l.remove_tag(key),
        }
    }

    /// Whether a field is present. Metric keys are sanitized before lookup.
    pub fn has_field(&self, key: &str) -> bool {
        match self {
            Event::Raw(r) => r.has_field(key),
            Event::Metric(m) => m.has_field(key),
            Event::LogLine(l) => l.has_field(key),
        }
    }

    /// Add or replace a field. Metric keys are sanitized.
    pub fn add_field(&mut self, key: &str, value: FieldValue) {
        match self {
            Event::Raw(r) => r.add_field(key, value),
            Event::Metric(m) => m.add_field(key, value),
            Event::LogLine(l) => l.add_field(key, value),
        }
    }

    /// Remove a field if present.
    pub fn remove_field(&mut self, key: &str) {
        match self {
            Event::Raw(r) => r.remove_field(key),
            Event::Metric(m) => m.remove_field(key),
            Event::LogLine(l) => l.remove_field(key),
        }
    }

    /// Serialize the event into a line-protocol byte buffer.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Event::Raw(r) => r.serialize(),
            Event::Metric(m) => m.serialize(),
            Event::LogLine(l) => l.serialize(),
        }
    }

    /// Borrow the metric variant, if this is one.
    pub fn as_metric(&self) -> Option<&Metric> {
        match self {
            Event::Metric(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the raw variant, if this is one.
    pub fn as_raw(&self) -> Option<&Raw> {
        match self {
            Event::Raw(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow the log line variant, if this is one.
    pub fn as_log_line(&self) -> Option<&LogLine> {
        match self {
            Event::LogLine(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}

impl From<Raw> for Event {
    fn from(r: Raw) -> Self {
        Event::Raw(r)
    }
}

impl From<Metric> for Event {
    fn from(m: Metric) -> Self {
        Event::Metric(m)
    }
}

impl From<LogLine> for Event {
    fn from(l: LogLine) -> Self {
        Event::LogLine(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_display() {
        assert_eq!(EventType::Raw.to_string(), "raw");
        assert_eq!(EventType::Metric.to_string(), "metric");
        assert_eq!(EventType::LogLine.to_string(), "logline");
    }

    #[test]
    fn clone_is_deep() {
        let mut tags = Tags::new();
        tags.insert("region".into(), "eu".into());
        let mut fields = Fields::new();
        fields.insert("value".into(), FieldValue::Float(1.0));

        let m = Metric::new("deep", tags, fields, Utc::now(), MetricType::Untyped).unwrap();
        let original = Event::Metric(m);
        let mut copy = original.clone();

        copy.add_tag("region", "us");
        copy.add_field("other", FieldValue::Int(5));

        assert_eq!(original.tags().get("region").unwrap(), "eu");
        assert!(!original.has_field("other"));
        assert_eq!(copy.tags().get("region").unwrap(), "us");
    }
}
