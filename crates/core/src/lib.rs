//! Optic - Core
//!
//! The event model and the plugin interfaces the runtime pipeline consumes.
//!
//! # Overview
//!
//! Everything that flows through an Optic pipeline is an [`Event`]: a raw
//! byte payload, a numeric metric, or a textual log line. Events carry tags
//! (string → string) and fields (string → scalar), a timestamp, and know how
//! to serialize themselves into the line protocol.
//!
//! Plugins come in five kinds, each behind a trait:
//!
//! - [`Source`] — produces events on a schedule (or continuously, see
//!   [`ServiceSource`])
//! - [`Processor`] — transforms an event stream in-flight
//! - [`Sink`] — writes batches of events to an external destination
//! - [`Buffer`] — per-sink bounded queue of events pending write
//! - [`Decoder`] / [`Encoder`] — translate between bytes and events
//!
//! Sources emit through an [`Accumulator`], which enriches events with
//! default tags and self-metrics before they enter the pipeline.

mod accumulator;
mod buffer;
mod codec;
mod error;
pub mod event;
mod plugin;

pub use accumulator::Accumulator;
pub use buffer::Buffer;
pub use codec::{Codec, Decoder, Encoder};
pub use error::{CodecError, EventError, PluginError};
pub use event::{Event, EventType, FieldValue, LogLine, Metric, MetricType, Raw};
pub use plugin::{Plugin, Processor, ServiceSink, ServiceSource, Sink, Source};

/// Result alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
