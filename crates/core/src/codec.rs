//! Codec interfaces: byte payloads to events and back

use crate::error::CodecError;
use crate::event::{Event, EventType};

/// Decodes byte payloads into events.
pub trait Decoder: Send + Sync {
    /// Select the event type this decoder produces.
    ///
    /// # Errors
    ///
    /// Returns an error when the codec cannot produce the requested type.
    fn set_event_type(&mut self, event_type: EventType) -> Result<(), CodecError>;

    /// Decode a payload into zero or more events.
    fn decode(&self, src: &[u8]) -> Result<Vec<Event>, CodecError>;

    /// Decode a single line into one event.
    fn decode_line(&self, line: &str) -> Result<Event, CodecError>;
}

/// Encodes events into byte payloads.
pub trait Encoder: Send + Sync {
    /// Encode an event into a fresh buffer.
    fn encode(&self, event: &Event) -> Result<Vec<u8>, CodecError>;

    /// Encode an event, appending to `dst`.
    fn encode_to(&self, event: &Event, dst: &mut Vec<u8>) -> Result<(), CodecError>;
}

/// A decoder and encoder in one plugin.
pub trait Codec: Decoder + Encoder {}

impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Codec")
    }
}

impl<T: Decoder + Encoder> Codec for T {}
