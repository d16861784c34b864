//! Processor registry

mod noop;
mod printer;

use std::collections::HashMap;

use optic_core::{PluginError, PluginResult, Processor};

use crate::PluginTable;

pub use noop::NoopProcessor;
pub use printer::PrinterProcessor;

/// Creates a processor from its configuration table.
pub type ProcessorCreator = fn(&PluginTable) -> PluginResult<Box<dyn Processor>>;

/// Registry of processor kinds.
#[derive(Default)]
pub struct ProcessorRegistry {
    creators: HashMap<String, ProcessorCreator>,
}

impl ProcessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor kind.
    pub fn register(&mut self, kind: &str, creator: ProcessorCreator) {
        self.creators.insert(kind.to_string(), creator);
    }

    /// Whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.creators.contains_key(kind)
    }

    /// Create a processor of the given kind.
    pub fn create(&self, kind: &str, config: &PluginTable) -> PluginResult<Box<dyn Processor>> {
        let creator = self
            .creators
            .get(kind)
            .ok_or_else(|| PluginError::config(format!("undefined but requested processor kind: {}", kind)))?;
        creator(config)
    }
}

/// Registry with the built-in processor kinds.
pub fn defaults() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register("noop", noop::create);
    registry.register("printer", printer::create);
    registry
}
