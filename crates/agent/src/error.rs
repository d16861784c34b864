//! Agent error types

use thiserror::Error;

use optic_core::PluginError;

/// Fatal agent failures. Plugin runtime errors are not here: they are
/// logged and counted, never fatal.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The OS hostname could not be determined
    #[error("failed to determine hostname: {0}")]
    Hostname(#[source] std::io::Error),

    /// A sink's service failed to start
    #[error("service for sink '{name}' failed to start: {source}")]
    SinkServiceStart {
        /// Sink identity
        name: String,
        /// Underlying error
        #[source]
        source: PluginError,
    },

    /// A source's service failed to start
    #[error("service for source '{name}' failed to start: {source}")]
    SourceServiceStart {
        /// Source identity
        name: String,
        /// Underlying error
        #[source]
        source: PluginError,
    },

    /// A sink could not be connected, even after the retry
    #[error("failed to connect to sink '{name}': {source}")]
    SinkConnect {
        /// Sink identity
        name: String,
        /// Underlying error
        #[source]
        source: PluginError,
    },

    /// A gather failed during the one-shot test command
    #[error("gather failed for source '{name}': {source}")]
    TestGather {
        /// Source identity
        name: String,
        /// Underlying error
        #[source]
        source: PluginError,
    },
}
