//! Source registry

mod internal;

use std::collections::HashMap;

use optic_core::{PluginError, PluginResult, Source};

use crate::PluginTable;

pub use internal::InternalSource;

/// Creates a source from its configuration table.
pub type SourceCreator = fn(&PluginTable) -> PluginResult<Box<dyn Source>>;

/// Registry of source kinds.
#[derive(Default)]
pub struct SourceRegistry {
    creators: HashMap<String, SourceCreator>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source kind.
    pub fn register(&mut self, kind: &str, creator: SourceCreator) {
        self.creators.insert(kind.to_string(), creator);
    }

    /// Whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.creators.contains_key(kind)
    }

    /// Create a source of the given kind.
    pub fn create(&self, kind: &str, config: &PluginTable) -> PluginResult<Box<dyn Source>> {
        let creator = self
            .creators
            .get(kind)
            .ok_or_else(|| PluginError::config(format!("undefined but requested source kind: {}", kind)))?;
        creator(config)
    }
}

/// Registry with the built-in source kinds.
pub fn defaults() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register("internal", internal::create);
    registry
}
