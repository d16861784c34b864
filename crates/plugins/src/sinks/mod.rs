//! Sink registry

mod discard;
mod file;

use std::collections::HashMap;

use optic_core::{PluginError, PluginResult, Sink};

use crate::PluginTable;

pub use discard::DiscardSink;
pub use file::FileSink;

/// Creates a sink from its configuration table.
pub type SinkCreator = fn(&PluginTable) -> PluginResult<Box<dyn Sink>>;

/// Registry of sink kinds.
#[derive(Default)]
pub struct SinkRegistry {
    creators: HashMap<String, SinkCreator>,
}

impl SinkRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink kind.
    pub fn register(&mut self, kind: &str, creator: SinkCreator) {
        self.creators.insert(kind.to_string(), creator);
    }

    /// Whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.creators.contains_key(kind)
    }

    /// Create a sink of the given kind.
    pub fn create(&self, kind: &str, config: &PluginTable) -> PluginResult<Box<dyn Sink>> {
        let creator = self
            .creators
            .get(kind)
            .ok_or_else(|| PluginError::config(format!("undefined but requested sink kind: {}", kind)))?;
        creator(config)
    }
}

/// Registry with the built-in sink kinds.
pub fn defaults() -> SinkRegistry {
    let mut registry = SinkRegistry::new();
    registry.register("discard", discard::create);
    registry.register("file", file::create);
    registry
}
