//! Core error types

use thiserror::Error;

use crate::event::EventType;

/// Errors raised while constructing events
#[derive(Debug, Error)]
pub enum EventError {
    /// Metric constructed without a name
    #[error("missing metric name")]
    MissingMetricName,

    /// Metric constructed without any fields
    #[error("{name}: must have one or more fields")]
    NoFields {
        /// Metric name
        name: String,
    },

    /// Metric name does not match `[a-zA-Z][a-zA-Z0-9_:]*`
    #[error("invalid metric name: {name}")]
    InvalidMetricName {
        /// The rejected name
        name: String,
    },

    /// Field key does not match the metric name grammar
    #[error("{name}: invalid field key: {key}")]
    InvalidFieldKey {
        /// Metric name
        name: String,
        /// The rejected key
        key: String,
    },

    /// Raw event constructed without a source
    #[error("missing raw source")]
    MissingRawSource,

    /// Log line constructed without content
    #[error("missing logline content")]
    MissingLogLineContent,
}

/// Errors raised by codecs
#[derive(Debug, Error)]
pub enum CodecError {
    /// The codec does not handle this event type
    #[error("{codec} codec does not support {event_type} event type")]
    UnsupportedEventType {
        /// Codec kind
        codec: &'static str,
        /// The unsupported event type
        event_type: EventType,
    },

    /// A line could not be decoded
    #[error("can not decode line: [{line}], for codec: {codec}")]
    DecodeLine {
        /// Codec kind
        codec: &'static str,
        /// The offending input
        line: String,
    },

    /// Malformed input payload
    #[error("{0}")]
    Malformed(String),
}

/// Errors surfaced by plugins at runtime
///
/// Plugin runtime errors are never fatal to the agent: they are routed
/// through `Accumulator::add_error`, logged with the plugin name, and
/// counted.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Free-form plugin failure
    #[error("{0}")]
    Message(String),

    /// I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Event construction failure
    #[error(transparent)]
    Event(#[from] EventError),

    /// Codec failure
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Invalid plugin configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PluginError {
    /// Create a free-form plugin error
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
