//! Configuration error types

use thiserror::Error;

use optic_core::PluginError;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading configuration or building the
/// pipeline graph
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// No configuration file was specified and none was found in the
    /// default locations
    #[error("no config file specified, and could not find one in $OPTIC_CONFIG_PATH, {home}, or {etc}")]
    NoConfigFile {
        /// Home candidate path
        home: String,
        /// System candidate path
        etc: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A section had an unexpected shape
    #[error("invalid {section} configuration: {message}")]
    InvalidSection {
        /// Section name
        section: String,
        /// What was wrong
        message: String,
    },

    /// A plugin section is missing its `kind`
    #[error("undefined {plugin_type} kind for: {name}")]
    UndefinedKind {
        /// Plugin type (source, processor, sink)
        plugin_type: &'static str,
        /// Plugin name
        name: String,
    },

    /// Two plugins of the same type share a name
    #[error("cannot have multiple {plugin_type}s with the same name: {name}")]
    DuplicateName {
        /// Plugin type
        plugin_type: &'static str,
        /// The colliding name
        name: String,
    },

    /// A plugin option had an invalid value
    #[error("{plugin_type} '{name}' has invalid {option}: {message}")]
    InvalidOption {
        /// Plugin type
        plugin_type: &'static str,
        /// Plugin name
        name: String,
        /// Option name
        option: &'static str,
        /// What was wrong
        message: String,
    },

    /// A source declared no `forwards` list
    #[error("source '{name}' is missing required option 'forwards'")]
    MissingForwards {
        /// Source name
        name: String,
    },

    /// A referenced plugin has not been built yet; the builder requeues
    /// the entry and retries
    #[error("plugin reference not found: {reference}")]
    ReferenceNotFound {
        /// The unresolved name
        reference: String,
    },

    /// A reference stayed unresolved after the retry budget
    #[error("possible circular reference, plugin reference not found: {reference}")]
    CircularReference {
        /// The unresolved name
        reference: String,
    },

    /// The graph build exceeded its time guard
    #[error("timeout reached while building configuration, remaining: {remaining}")]
    BuildTimeout {
        /// Entries still queued when the guard fired
        remaining: usize,
    },

    /// A plugin factory rejected its configuration
    #[error("error building {plugin_type} '{name}': {source}")]
    Plugin {
        /// Plugin type
        plugin_type: &'static str,
        /// Plugin name
        name: String,
        /// Underlying plugin error
        #[source]
        source: PluginError,
    },
}
