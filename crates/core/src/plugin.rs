//! Plugin interfaces consumed by the core pipeline
//!
//! Concrete plugin implementations live outside the core; the runtime only
//! sees these traits. Optional capabilities (service lifecycle, codec
//! injection) are discovered through default-no-op hooks rather than
//! downcasting.

use std::sync::Arc;

use async_trait::async_trait;

use crate::accumulator::Accumulator;
use crate::codec::{Decoder, Encoder};
use crate::event::Event;
use crate::PluginResult;

/// Base interface all Optic plugins satisfy.
pub trait Plugin: Send + Sync {
    /// Unique kind of the plugin, used as the registry key.
    fn kind(&self) -> &'static str;

    /// One-sentence description of the plugin.
    fn description(&self) -> &'static str;
}

/// A plugin that produces events, polled once per interval.
#[async_trait]
pub trait Source: Plugin {
    /// Gather telemetry into the accumulator. Called every interval.
    async fn gather(&self, acc: &dyn Accumulator) -> PluginResult<()>;

    /// The service capability, for long-running push-driven sources.
    /// Service sources are started once instead of being polled.
    fn as_service(&self) -> Option<&dyn ServiceSource> {
        None
    }

    /// Inject a decoder. Returns whether the source consumed it.
    fn set_decoder(&mut self, decoder: Box<dyn Decoder>) -> bool {
        let _ = decoder;
        false
    }
}

/// Long-running source extension: started once at agent startup, stopped at
/// shutdown; no periodic gather is issued.
#[async_trait]
pub trait ServiceSource: Send + Sync {
    /// Start the source's service. The accumulator is retained for the
    /// lifetime of the service.
    async fn start(&self, acc: Arc<dyn Accumulator>) -> PluginResult<()>;

    /// Stop the service and release its resources.
    fn stop(&self);
}

/// A plugin that transforms in-flight events.
pub trait Processor: Plugin {
    /// One-time initialization, run when the pipeline is built.
    fn init(&mut self) -> PluginResult<()> {
        Ok(())
    }

    /// Apply the processor to the given events. May filter (return fewer),
    /// expand (return more), or buffer (return none now, emit on a later
    /// call — an empty input is the flush signal for stateful processors).
    fn apply(&self, events: Vec<Event>) -> Vec<Event>;
}

/// A plugin that writes events to an external destination.
#[async_trait]
pub trait Sink: Plugin {
    /// Connect to the destination.
    async fn connect(&self) -> PluginResult<()>;

    /// Close any connections to the destination.
    async fn close(&self) -> PluginResult<()>;

    /// Write a batch of events.
    async fn write(&self, events: &[Event]) -> PluginResult<()>;

    /// The service capability, for sinks that run their own service.
    fn as_service(&self) -> Option<&dyn ServiceSink> {
        None
    }

    /// Inject an encoder. Returns whether the sink consumed it.
    fn set_encoder(&mut self, encoder: Box<dyn Encoder>) -> bool {
        let _ = encoder;
        false
    }
}

/// Service extension for sinks.
#[async_trait]
pub trait ServiceSink: Send + Sync {
    /// Start the service backing the sink.
    async fn start(&self) -> PluginResult<()>;

    /// Stop the service.
    fn stop(&self);
}
