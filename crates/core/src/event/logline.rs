//! Log line events: unstructured text plus metadata

use std::fmt;

use chrono::{DateTime, Utc};

use super::{FieldValue, Fields, Tags};
use crate::error::EventError;

/// A line of text read from some path, plus tags and fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    ts: DateTime<Utc>,
    tags: Tags,
    fields: Fields,
    path: String,
    content: String,
}

impl LogLine {
    /// Construct a log line. Tag entries with an empty key are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when `content` is empty.
    pub fn new(
        path: &str,
        content: &str,
        tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        if content.is_empty() {
            return Err(EventError::MissingLogLineContent);
        }

        let mut out = LogLine {
            ts,
            tags: Tags::new(),
            fields,
            path: path.to_string(),
            content: content.to_string(),
        };
        for (k, v) in tags {
            if k.is_empty() {
                continue;
            }
            out.tags.insert(k, v);
        }
        Ok(out)
    }

    /// The path this line originated from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The line content.
    pub fn content(&self) -> &str {
        &self.content
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

    /// The line content as bytes.
    pub fn serialize(&self) -> Vec<u8> {
        self.content.as_bytes().to_vec()
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
