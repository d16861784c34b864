//! In-memory buffer

use serde::Deserialize;

use optic_core::{Buffer, Event, Plugin, PluginError, PluginResult};

use crate::PluginTable;

const KIND: &str = "memory";
const DESCRIPTION: &str = "Memory is a buffer which stores events in memory.";

/// Default capacity of a memory buffer.
pub const DEFAULT_BUFFER_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MemoryConfig {
    limit: i64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { limit: DEFAULT_BUFFER_LIMIT as i64 }
    }
}

/// Bounded in-memory event queue. When an append would exceed capacity the
/// oldest events are evicted.
pub struct MemoryBuffer {
    limit: usize,
    buffer: Vec<Event>,
}

impl MemoryBuffer {
    /// Create a buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_BUFFER_LIMIT)
    }

    /// Create a buffer with an explicit capacity.
    pub fn with_limit(limit: usize) -> Self {
        Self { limit, buffer: Vec::new() }
    }
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn create(config: &PluginTable) -> PluginResult<Box<dyn Buffer>> {
    let config: MemoryConfig = crate::from_table(config)?;
    if config.limit <= 0 {
        return Err(PluginError::config(format!(
            "buffer limit must be positive number: {}",
            config.limit
        )));
    }
    let mut buffer = MemoryBuffer::with_limit(config.limit as usize);
    buffer.build()?;
    Ok(Box::new(buffer))
}

impl Plugin for MemoryBuffer {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }
}

impl Buffer for MemoryBuffer {
    fn build(&mut self) -> PluginResult<()> {
        if self.limit == 0 {
            return Err(PluginError::config("buffer limit must be positive number: 0"));
        }
        self.buffer = Vec::new();
        Ok(())
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn cap(&self) -> usize {
        self.limit
    }

    fn append(&mut self, mut events: Vec<Event>) {
        let incoming = events.len();
        let used = self.buffer.len();

        if used + incoming > self.limit {
            if incoming > self.limit {
                // the new events alone overflow the buffer, keep the tail
                events.drain(..incoming - self.limit);
                self.buffer = events;
                return;
            }
            let overflow = used + incoming - self.limit;
            self.remove_range(0, overflow);
        }

        self.buffer.append(&mut events);
    }

    fn slice(&self, start: usize, end: usize) -> Vec<Event> {
        if end <= start || start >= self.buffer.len() {
            return Vec::new();
        }
        let end = end.min(self.buffer.len());
        self.buffer[start..end].to_vec()
    }

    fn remove_range(&mut self, from: usize, to: usize) {
        if to <= from || from >= self.buffer.len() {
            return;
        }
        let to = to.min(self.buffer.len());
        self.buffer.drain(from..to);
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn close(&mut self) -> PluginResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use optic_core::event::{Fields, Tags};
    use optic_core::{FieldValue, Metric, MetricType};

    fn event(n: i64) -> Event {
        let mut fields = Fields::new();
        fields.insert("value".into(), FieldValue::Int(n));
        Event::Metric(
            Metric::new("buftest", Tags::new(), fields, Utc::now(), MetricType::Untyped).unwrap(),
        )
    }

    fn value_of(e: &Event) -> i64 {
        e.fields().get("value").and_then(|v| v.as_int()).unwrap()
    }

    #[test]
    fn append_within_capacity() {
        let mut b = MemoryBuffer::with_limit(5);
        b.append(vec![event(1), event(2)]);
        assert_eq!(b.len(), 2);
        assert!(!b.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut b = MemoryBuffer::with_limit(3);
        b.append(vec![event(1), event(2), event(3)]);
        b.append(vec![event(4), event(5)]);

        assert_eq!(b.len(), 3);
        let contents = b.slice(0, 3);
        let values: Vec<i64> = contents.iter().map(value_of).collect();
        assert_eq!(values, vec![3, 4, 5]);
    }

    #[test]
    fn oversized_append_keeps_tail() {
        let mut b = MemoryBuffer::with_limit(3);
        b.append(vec![event(0)]);
        b.append(vec![event(1), event(2), event(3), event(4), event(5)]);

        assert_eq!(b.len(), 3);
        let values: Vec<i64> = b.slice(0, 3).iter().map(value_of).collect();
        assert_eq!(values, vec![3, 4, 5]);
    }

    #[test]
    fn sequential_overflow_retains_most_recent() {
        let mut b = MemoryBuffer::with_limit(1000);
        for i in 0..5000 {
            b.append(vec![event(i)]);
        }
        assert_eq!(b.len(), 1000);
        assert_eq!(value_of(&b.slice(0, 1)[0]), 4000);
        assert_eq!(value_of(&b.slice(999, 1000)[0]), 4999);
    }

    #[test]
    fn slice_tolerates_out_of_range() {
        let mut b = MemoryBuffer::with_limit(10);
        b.append(vec![event(1), event(2)]);

        assert!(b.slice(5, 10).is_empty());
        assert!(b.slice(1, 1).is_empty());
        assert_eq!(b.slice(0, 100).len(), 2);
        assert_eq!(b.slice(1, 2).len(), 1);
    }

    #[test]
    fn remove_range_tolerates_out_of_range() {
        let mut b = MemoryBuffer::with_limit(10);
        b.append(vec![event(1), event(2), event(3)]);

        b.remove_range(5, 10);
        assert_eq!(b.len(), 3);
        b.remove_range(2, 100);
        assert_eq!(b.len(), 2);
        b.remove_range(0, 1);
        assert_eq!(b.len(), 1);
        assert_eq!(value_of(&b.slice(0, 1)[0]), 2);
    }

    #[test]
    fn clear_empties() {
        let mut b = MemoryBuffer::with_limit(10);
        b.append(vec![event(1)]);
        b.clear();
        assert!(b.is_empty());
    }

    #[test]
    fn create_rejects_nonpositive_limit() {
        let mut table = PluginTable::new();
        table.insert("limit".into(), toml::Value::Integer(0));
        assert!(create(&table).is_err());

        table.insert("limit".into(), toml::Value::Integer(-5));
        assert!(create(&table).is_err());
    }

    #[test]
    fn create_applies_limit() {
        let mut table = PluginTable::new();
        table.insert("limit".into(), toml::Value::Integer(77));
        let buffer = create(&table).unwrap();
        assert_eq!(buffer.cap(), 77);
    }
}
