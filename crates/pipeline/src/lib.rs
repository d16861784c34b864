//! Optic - Pipeline
//!
//! The running pipeline nodes. Each configured plugin is wrapped in a
//! `Running*` node that owns the plugin instance, its node configuration,
//! its forward function, and its self-metrics:
//!
//! - [`RunningSource`] — owns the per-source event channel and implements
//!   [`EventMaker`]: it enriches events with plugin-level then agent-level
//!   default tags, validates them, and counts them.
//! - [`RunningProcessor`] — counts processed/filtered events around the
//!   plugin's `apply`, and forwards results downstream.
//! - [`RunningSink`] — owns the sink's buffer; batches, writes, retries.
//!
//! # Forwarding
//!
//! Nodes route events through a [`ForwardFn`] built at construction from
//! the node's configured downstreams. The dispatch strategy is zero-copy
//! when there is a single downstream and deep-copy on fan-out, so each
//! recipient receives an independently mutable event.

mod accumulator;
mod forward;
mod running_processor;
mod running_sink;
mod running_source;

pub use accumulator::{ChannelAccumulator, EventMaker};
pub use forward::{forward_fn, ForwardFn, ForwardFuture};
pub use running_processor::{ProcessorNodeConfig, RunningProcessor};
pub use running_sink::{RunningSink, SinkNodeConfig, DEFAULT_EVENT_BATCH_SIZE};
pub use running_source::{
    RunningSource, SourceNodeConfig, DEFAULT_EVENT_CHANNEL_CAPACITY,
};
