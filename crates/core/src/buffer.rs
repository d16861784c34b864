//! Buffer interface: per-sink bounded event storage

use crate::event::Event;
use crate::plugin::Plugin;
use crate::PluginResult;

/// A bounded, ordered store of events pending write.
///
/// Each running sink owns exactly one buffer; all operations happen under
/// the sink's lock. When an append would exceed capacity, the oldest events
/// are dropped — producers never block on a slow sink.
impl std::fmt::Debug for dyn Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer").field("kind", &self.kind()).finish()
    }
}

pub trait Buffer: Plugin {
    /// Validate configuration and allocate storage.
    fn build(&mut self) -> PluginResult<()>;

    /// Current number of buffered events.
    fn len(&self) -> usize;

    /// Maximum capacity of the buffer.
    fn cap(&self) -> usize;

    /// Add events, evicting from the head on overflow.
    fn append(&mut self, events: Vec<Event>);

    /// Events in `[start, end)`. Tolerant: out-of-range offsets yield an
    /// empty result, a too-large `end` is clamped.
    fn slice(&self, start: usize, end: usize) -> Vec<Event>;

    /// Remove events whose index is in `[from, to)`. Tolerant of
    /// out-of-range offsets.
    fn remove_range(&mut self, from: usize, to: usize);

    /// Remove all events.
    fn clear(&mut self);

    /// Whether the buffer holds no events.
    fn is_empty(&self) -> bool;

    /// Release the buffer's resources.
    fn close(&mut self) -> PluginResult<()>;
}
