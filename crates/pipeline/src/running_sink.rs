//! Running sink node
//!
//! Owns the sink's buffer. All buffer operations and the plugin write
//! happen under one lock, so there is at most one flush in flight per sink
//! and buffer order is preserved across concurrent `write_event` callers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use optic_core::event::Tags;
use optic_core::{Buffer, Encoder, Event, PluginResult, ServiceSink, Sink};
use optic_selfmetric::{self as selfmetric, Counter, Gauge, Histogram};

/// Default number of events per write batch.
pub const DEFAULT_EVENT_BATCH_SIZE: usize = 1000;

/// Node configuration for a sink.
pub struct SinkNodeConfig {
    /// Registry kind of the plugin
    pub kind: String,
    /// Configured name, unique among sinks
    pub name: String,
    /// Events per write batch
    pub batch_size: usize,
}

/// A configured sink in the running pipeline.
pub struct RunningSink {
    sink: Box<dyn Sink>,
    /// Node configuration
    pub config: SinkNodeConfig,
    buffer: Mutex<Box<dyn Buffer>>,
    buffer_size: Gauge,
    events_written: Counter,
    write_time: Histogram,
}

impl std::fmt::Debug for RunningSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningSink")
            .field("name", &self.config.name)
            .finish()
    }
}

impl RunningSink {
    /// Wrap a sink plugin with its buffer. When the sink consumes an
    /// encoder, the configured codec is injected here.
    pub fn new(
        mut sink: Box<dyn Sink>,
        mut config: SinkNodeConfig,
        buffer: Box<dyn Buffer>,
        encoder: Option<Box<dyn Encoder>>,
    ) -> Arc<Self> {
        if config.batch_size == 0 {
            config.batch_size = DEFAULT_EVENT_BATCH_SIZE;
        }

        if let Some(encoder) = encoder {
            sink.set_encoder(encoder);
        }

        let mut tags = Tags::new();
        tags.insert("sink".into(), config.name.clone());

        let buffer_limit = selfmetric::get_or_register_gauge("sink", "buffer_limit", tags.clone());
        buffer_limit.update(buffer.cap() as i64);

        Arc::new(Self {
            sink,
            buffer_size: selfmetric::get_or_register_gauge("sink", "buffer_size", tags.clone()),
            events_written: selfmetric::get_or_register_counter(
                "sink",
                "events_written",
                tags.clone(),
            ),
            write_time: selfmetric::get_or_register_histogram(
                "sink",
                "write_time_nanoseconds",
                tags,
            ),
            config,
            buffer: Mutex::new(buffer),
        })
    }

    /// Pipeline identity of this node.
    pub fn name(&self) -> String {
        format!("sinks.{}", self.config.name)
    }

    /// Connect the underlying sink.
    pub async fn connect(&self) -> PluginResult<()> {
        self.sink.connect().await
    }

    /// Close the underlying sink.
    pub async fn close(&self) -> PluginResult<()> {
        self.sink.close().await
    }

    /// The sink's service capability, when present.
    pub fn as_service_sink(&self) -> Option<&dyn ServiceSink> {
        self.sink.as_service()
    }

    /// Current buffered event count.
    pub async fn buffer_len(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Append an event to the buffer; when the buffer has reached a full
    /// batch, trigger a write.
    pub async fn write_event(&self, event: Event) {
        let len = {
            let mut buffer = self.buffer.lock().await;
            buffer.append(vec![event]);
            buffer.len()
        };

        if len >= self.config.batch_size {
            if let Err(e) = self.write().await {
                tracing::warn!(sink = %self.name(), error = %e, "batch-triggered write failed");
            }
        }
    }

    /// Write all buffered events in `batch_size` steps.
    ///
    /// Successful batches are removed from the buffer and counted. A failed
    /// batch stays buffered for the next flush and the window advances past
    /// it. Per-batch failures are logged, never fatal.
    pub async fn write(&self) -> PluginResult<()> {
        let mut buffer = self.buffer.lock().await;

        let n_events = buffer.len();
        self.buffer_size.update(n_events as i64);
        tracing::debug!(
            sink = %self.config.name,
            used = n_events,
            cap = buffer.cap(),
            "sink buffer fullness"
        );

        let batch_size = self.config.batch_size;
        let mut start = 0;
        let mut end = batch_size;
        let mut iterations = 0;

        loop {
            if iterations > 0 && buffer.len() < batch_size {
                break;
            }
            iterations += 1;

            let batch = buffer.slice(start, end);
            if batch.is_empty() {
                // nothing left at or past the window
                break;
            }
            match self.write_batch(&batch).await {
                Ok(()) => {
                    buffer.remove_range(start, end);
                }
                Err(e) => {
                    // leave the batch for retry on the next flush
                    tracing::warn!(
                        sink = %self.config.name,
                        error = %e,
                        batch = batch.len(),
                        "failed to write batch, keeping events buffered"
                    );
                    start += batch_size;
                    end += batch_size;
                    if start > n_events {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn write_batch(&self, events: &[Event]) -> PluginResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        let result = self.sink.write(events).await;
        let elapsed = started.elapsed();

        if result.is_ok() {
            tracing::debug!(
                sink = %self.config.name,
                count = events.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "wrote batch"
            );
            self.events_written.inc(events.len() as i64);
            self.write_time.update(elapsed.as_nanos() as i64);
        }
        result
    }
}

#[cfg(test)]
#[path = "running_sink_test.rs"]
mod running_sink_test;
