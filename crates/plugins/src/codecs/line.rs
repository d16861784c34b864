//! Line codec
//!
//! Newline-delimited payloads. Decoding raw events wraps each line in a
//! `Raw`; decoding metrics parses the line protocol emitted by
//! `Metric::serialize`, so encode → decode round-trips.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use optic_core::event::{Fields, Tags};
use optic_core::{
    Codec, CodecError, Decoder, Encoder, Event, EventType, FieldValue, Metric, MetricType,
    PluginResult, Raw,
};

use crate::PluginTable;

const KIND: &str = "line";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LineConfig {
    tags: BTreeMap<String, String>,
}

/// Codec for newline-delimited payloads.
pub struct LineCodec {
    event_type: EventType,
    default_tags: Tags,
}

impl LineCodec {
    /// Codec producing raw events with no default tags.
    pub fn new() -> Self {
        Self {
            event_type: EventType::Raw,
            default_tags: Tags::new(),
        }
    }

    /// Codec with default tags applied to every decoded event.
    pub fn with_tags(tags: Tags) -> Self {
        Self {
            event_type: EventType::Raw,
            default_tags: tags,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn create(config: &PluginTable) -> PluginResult<Box<dyn Codec>> {
    let config: LineConfig = crate::from_table(config)?;
    Ok(Box::new(LineCodec::with_tags(config.tags)))
}

impl Decoder for LineCodec {
    fn set_event_type(&mut self, event_type: EventType) -> Result<(), CodecError> {
        match event_type {
            EventType::Raw | EventType::Metric => {
                self.event_type = event_type;
                Ok(())
            }
            EventType::LogLine => Err(CodecError::UnsupportedEventType {
                codec: KIND,
                event_type,
            }),
        }
    }

    fn decode(&self, src: &[u8]) -> Result<Vec<Event>, CodecError> {
        let mut events = Vec::new();
        for chunk in src.split(|b| *b == b'\n') {
            if chunk.is_empty() {
                continue;
            }
            match self.event_type {
                EventType::Raw => {
                    let raw = Raw::new(
                        KIND,
                        chunk,
                        self.default_tags.clone(),
                        Fields::new(),
                        Utc::now(),
                    )
                    .map_err(|e| CodecError::Malformed(e.to_string()))?;
                    events.push(Event::Raw(raw));
                }
                EventType::Metric => {
                    let text = std::str::from_utf8(chunk)
                        .map_err(|e| CodecError::Malformed(e.to_string()))?;
                    let mut metric = parse_metric_line(text)?;
                    for (k, v) in &self.default_tags {
                        if !metric.has_tag(k) {
                            metric.add_tag(k, v);
                        }
                    }
                    events.push(Event::Metric(metric));
                }
                EventType::LogLine => {
                    return Err(CodecError::UnsupportedEventType {
                        codec: KIND,
                        event_type: self.event_type,
                    })
                }
            }
        }
        Ok(events)
    }

    fn decode_line(&self, line: &str) -> Result<Event, CodecError> {
        let events = self.decode(line.as_bytes())?;
        events.into_iter().next().ok_or_else(|| CodecError::DecodeLine {
            codec: KIND,
            line: line.to_string(),
        })
    }
}

impl Encoder for LineCodec {
    fn encode(&self, event: &Event) -> Result<Vec<u8>, CodecError> {
        let mut out = event.serialize();
        out.push(b'\n');
        Ok(out)
    }

    fn encode_to(&self, event: &Event, dst: &mut Vec<u8>) -> Result<(), CodecError> {
        dst.extend_from_slice(&event.serialize());
        dst.push(b'\n');
        Ok(())
    }
}

/// Parse one metric line: `name[,k=v]* k=v[ k=v]* <unix_nanos>`.
fn parse_metric_line(line: &str) -> Result<Metric, CodecError> {
    let malformed = |msg: &str| CodecError::Malformed(format!("{}: [{}]", msg, line));

    let tokens = tokenize(line).ok_or_else(|| malformed("unterminated string"))?;
    if tokens.len() < 3 {
        return Err(malformed("expected name, fields, and timestamp"));
    }

    // first token: name plus comma-separated tags
    let mut head = tokens[0].split(',');
    let name = head.next().unwrap_or_default().to_string();
    if name.is_empty() {
        return Err(malformed("missing metric name"));
    }
    let mut tags = Tags::new();
    for pair in head {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| malformed("malformed tag"))?;
        tags.insert(k.to_string(), v.to_string());
    }

    // last token: nanosecond timestamp
    let nanos: i64 = tokens[tokens.len() - 1]
        .parse()
        .map_err(|_| malformed("malformed timestamp"))?;
    let ts: DateTime<Utc> = DateTime::from_timestamp_nanos(nanos);

    // middle tokens: fields
    let mut fields = Fields::new();
    for token in &tokens[1..tokens.len() - 1] {
        let (k, v) = token
            .split_once('=')
            .ok_or_else(|| malformed("malformed field"))?;
        fields.insert(k.to_string(), parse_field_value(v).ok_or_else(|| malformed("malformed field value"))?);
    }
    if fields.is_empty() {
        return Err(malformed("metric without fields"));
    }

    Ok(Metric::parsed(&name, tags, fields, ts, MetricType::Untyped))
}

fn parse_field_value(s: &str) -> Option<FieldValue> {
    if let Some(inner) = s.strip_prefix('"') {
        let inner = inner.strip_suffix('"')?;
        return Some(FieldValue::Str(unescape(inner)));
    }
    match s {
        "true" => return Some(FieldValue::Bool(true)),
        "false" => return Some(FieldValue::Bool(false)),
        _ => {}
    }
    if let Some(int_part) = s.strip_suffix('i') {
        if let Ok(v) = int_part.parse::<i64>() {
            return Some(FieldValue::Int(v));
        }
    }
    s.parse::<f64>().ok().map(FieldValue::Float)
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// Split on spaces, keeping double-quoted runs (with backslash escapes)
// inside a single token.
fn tokenize(line: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Some(tokens)
}

#[cfg(test)]
#[path = "line_test.rs"]
mod line_test;
