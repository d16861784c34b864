//! Buffer registry
//!
//! Sinks that do not configure a buffer get the default: `memory` with a
//! 1000-event cap.

mod memory;

use std::collections::HashMap;

use optic_core::{Buffer, PluginError, PluginResult};

use crate::PluginTable;

pub use memory::MemoryBuffer;

/// Creates a configured, built buffer from its configuration table.
pub type BufferCreator = fn(&PluginTable) -> PluginResult<Box<dyn Buffer>>;

/// Registry of buffer kinds.
#[derive(Default)]
pub struct BufferRegistry {
    creators: HashMap<String, BufferCreator>,
}

impl BufferRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer kind.
    pub fn register(&mut self, kind: &str, creator: BufferCreator) {
        self.creators.insert(kind.to_string(), creator);
    }

    /// Whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.creators.contains_key(kind)
    }

    /// Create and build a buffer of the given kind.
    pub fn create(&self, kind: &str, config: &PluginTable) -> PluginResult<Box<dyn Buffer>> {
        let creator = self
            .creators
            .get(kind)
            .ok_or_else(|| PluginError::config(format!("invalid buffer kind: {}", kind)))?;
        creator(config)
    }

    /// Create a buffer from a configuration table carrying its own `kind`
    /// key. With no table at all, callers should use [`BufferRegistry::default_buffer`].
    pub fn from_config(&self, config: &PluginTable) -> PluginResult<Box<dyn Buffer>> {
        let mut config = config.clone();
        let kind = match config.remove("kind") {
            Some(toml::Value::String(s)) if !s.is_empty() => s,
            _ => return Err(PluginError::config("undefined buffer kind")),
        };
        self.create(&kind, &config)
    }

    /// The default buffer: `memory` with default capacity.
    pub fn default_buffer(&self) -> PluginResult<Box<dyn Buffer>> {
        self.create("memory", &PluginTable::new())
    }
}

/// Registry with the built-in buffer kinds.
pub fn defaults() -> BufferRegistry {
    let mut registry = BufferRegistry::new();
    registry.register("memory", memory::create);
    registry
}
