//! Codec registry
//!
//! A codec configuration table carries `kind` plus an optional `event` key
//! selecting the event type the decoder produces (`raw`, `metric`,
//! `logline`); the rest is handed to the codec's creator.

mod line;

use std::collections::HashMap;

use optic_core::{Codec, Decoder, Encoder, EventType, PluginError, PluginResult};

use crate::PluginTable;

pub use line::LineCodec;

/// Creates a codec from its configuration table.
pub type CodecCreator = fn(&PluginTable) -> PluginResult<Box<dyn Codec>>;

/// Registry of codec kinds.
#[derive(Default)]
pub struct CodecRegistry {
    creators: HashMap<String, CodecCreator>,
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec kind.
    pub fn register(&mut self, kind: &str, creator: CodecCreator) {
        self.creators.insert(kind.to_string(), creator);
    }

    /// Whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.creators.contains_key(kind)
    }

    /// Create a codec from a configuration table carrying `kind` and an
    /// optional `event` type.
    pub fn from_config(&self, config: &PluginTable) -> PluginResult<Box<dyn Codec>> {
        let mut config = config.clone();
        let kind = match config.remove("kind") {
            Some(toml::Value::String(s)) if !s.is_empty() => s,
            _ => return Err(PluginError::config("undefined codec kind")),
        };
        let event_type = match config.remove("event") {
            Some(toml::Value::String(s)) => Some(parse_event_type(&s)?),
            Some(other) => {
                return Err(PluginError::config(format!(
                    "invalid codec event type: {}",
                    other
                )))
            }
            None => None,
        };

        let creator = self
            .creators
            .get(&kind)
            .ok_or_else(|| PluginError::config(format!("invalid codec kind: {}", kind)))?;
        let mut codec = creator(&config)?;
        if let Some(event_type) = event_type {
            codec.set_event_type(event_type)?;
        }
        Ok(codec)
    }

    /// Create a codec configured as a decoder.
    pub fn new_decoder(&self, config: &PluginTable) -> PluginResult<Box<dyn Decoder>> {
        Ok(self.from_config(config)?)
    }

    /// Create a codec configured as an encoder.
    pub fn new_encoder(&self, config: &PluginTable) -> PluginResult<Box<dyn Encoder>> {
        Ok(self.from_config(config)?)
    }
}

fn parse_event_type(s: &str) -> PluginResult<EventType> {
    match s {
        "raw" => Ok(EventType::Raw),
        "metric" => Ok(EventType::Metric),
        "logline" => Ok(EventType::LogLine),
        other => Err(PluginError::config(format!("unknown event type: {}", other))),
    }
}

/// Registry with the built-in codec kinds.
pub fn defaults() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    registry.register("line", line::create);
    registry
}
