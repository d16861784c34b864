//! Plugin registries used while building a configuration

use optic_plugins::{buffers, codecs, processors, sinks, sources};

/// The per-kind factory registries the graph builder draws from.
pub struct Registries {
    /// Source factories
    pub sources: sources::SourceRegistry,
    /// Processor factories
    pub processors: processors::ProcessorRegistry,
    /// Sink factories
    pub sinks: sinks::SinkRegistry,
    /// Buffer factories
    pub buffers: buffers::BufferRegistry,
    /// Codec factories
    pub codecs: codecs::CodecRegistry,
}

impl Registries {
    /// Registries pre-populated with every built-in plugin.
    pub fn defaults() -> Self {
        Self {
            sources: sources::defaults(),
            processors: processors::defaults(),
            sinks: sinks::defaults(),
            buffers: buffers::defaults(),
            codecs: codecs::defaults(),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::defaults()
    }
}
