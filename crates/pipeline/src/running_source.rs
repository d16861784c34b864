//! Running source node
//!
//! Owns the per-source event channel and implements [`EventMaker`]: plugin
//! tags are applied first, then agent-level default tags, both
//! first-writer-wins, before validation and counting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use tokio::sync::mpsc;

use optic_core::event::{metric_name_valid, Fields, Tags};
use optic_core::{
    Accumulator, Event, LogLine, Metric, MetricType, PluginResult, Raw, ServiceSource, Source,
};
use optic_selfmetric::{self as selfmetric, Counter};

use crate::accumulator::EventMaker;
use crate::forward::{forward_fn, ForwardFn};
use crate::running_processor::RunningProcessor;
use crate::running_sink::RunningSink;

/// Capacity of every per-source event channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events accepted into the pipeline, process-wide.
static GLOBAL_EVENTS_PROCESSED: Lazy<Counter> =
    Lazy::new(|| selfmetric::get_or_register_counter("agent", "events_processed", Tags::new()));

/// Node configuration for a source.
pub struct SourceNodeConfig {
    /// Registry kind of the plugin
    pub kind: String,
    /// Configured name, unique among sources
    pub name: String,
    /// Per-source gather interval, overriding the agent default
    pub interval: Option<Duration>,
    /// Plugin-level default tags
    pub tags: Tags,
    /// Per-source processor chain, applied before forwarding
    pub processors: Vec<Arc<RunningProcessor>>,
    /// Downstream processors
    pub forward_processors: Vec<Arc<RunningProcessor>>,
    /// Downstream sinks
    pub forward_sinks: Vec<Arc<RunningSink>>,
}

/// A configured source in the running pipeline.
pub struct RunningSource {
    source: Box<dyn Source>,
    /// Node configuration
    pub config: SourceNodeConfig,

    // only used by the 'test' command
    trace: AtomicBool,
    default_tags: RwLock<Tags>,

    events_tx: mpsc::Sender<Event>,
    events_rx: StdMutex<Option<mpsc::Receiver<Event>>>,

    forward: ForwardFn,
    events_processed: Counter,
}

impl std::fmt::Debug for RunningSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningSource")
            .field("name", &self.config.name)
            .finish()
    }
}

impl RunningSource {
    /// Wrap a source plugin. The decoder, when configured, must already be
    /// injected into the plugin.
    pub fn new(source: Box<dyn Source>, config: SourceNodeConfig) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);

        let mut tags = Tags::new();
        tags.insert("source".into(), config.name.clone());

        let name = format!("sources.{}", config.name);
        let forward = forward_fn(&name, &config.forward_processors, &config.forward_sinks);

        Arc::new(Self {
            source,
            events_processed: selfmetric::get_or_register_counter(
                "sources",
                "events_processed",
                tags,
            ),
            config,
            trace: AtomicBool::new(false),
            default_tags: RwLock::new(Tags::new()),
            events_tx,
            events_rx: StdMutex::new(Some(events_rx)),
            forward,
        })
    }

    /// Pipeline identity of this node.
    pub fn name(&self) -> String {
        format!("sources.{}", self.config.name)
    }

    /// Whether trace echoing is enabled.
    pub fn trace(&self) -> bool {
        self.trace.load(Ordering::Relaxed)
    }

    /// Toggle trace echoing of constructed events to stdout.
    pub fn set_trace(&self, trace: bool) {
        self.trace.store(trace, Ordering::Relaxed);
    }

    /// Set the agent-level default tags applied after plugin tags.
    pub fn set_default_tags(&self, tags: Tags) {
        *self.default_tags.write().unwrap() = tags;
    }

    /// Sender side of the source's event channel.
    pub fn events_sender(&self) -> mpsc::Sender<Event> {
        self.events_tx.clone()
    }

    /// Take the receiver side of the event channel. Yields `Some` exactly
    /// once; the gatherer owns it from then on.
    pub fn take_events_receiver(&self) -> Option<mpsc::Receiver<Event>> {
        self.events_rx.lock().unwrap().take()
    }

    /// Gather from the wrapped plugin.
    pub async fn gather(&self, acc: &dyn Accumulator) -> PluginResult<()> {
        self.source.gather(acc).await
    }

    /// The plugin's service capability, when present.
    pub fn as_service_source(&self) -> Option<&dyn ServiceSource> {
        self.source.as_service()
    }

    /// Route an event to the configured downstreams.
    pub async fn forward_event(&self, event: Event) {
        (self.forward)(event).await;
    }

    fn merge_default_tags(&self, tags: &mut Tags) {
        for (k, v) in &self.config.tags {
            tags.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in self.default_tags.read().unwrap().iter() {
            tags.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    fn count_event(&self) {
        GLOBAL_EVENTS_PROCESSED.inc(1);
        self.events_processed.inc(1);
    }
}

impl EventMaker for RunningSource {
    fn name(&self) -> String {
        self.name()
    }

    fn make_raw(
        &self,
        source: &str,
        value: &[u8],
        mut tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
    ) -> Option<Event> {
        self.merge_default_tags(&mut tags);

        match Raw::new(source, value, tags, fields, ts) {
            Ok(raw) => {
                if self.trace() {
                    println!("> {}", raw);
                }
                self.count_event();
                Some(Event::Raw(raw))
            }
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "error adding raw");
                None
            }
        }
    }

    fn make_metric(
        &self,
        name: &str,
        mut tags: Tags,
        mut fields: Fields,
        metric_type: MetricType,
        ts: DateTime<Utc>,
    ) -> Option<Event> {
        if name.is_empty() || fields.is_empty() {
            return None;
        }
        self.merge_default_tags(&mut tags);

        fields.retain(|key, _| {
            if metric_name_valid(key) {
                true
            } else {
                tracing::debug!(metric = %name, field = %key, "invalid field name, skipping");
                false
            }
        });

        match Metric::new(name, tags, fields, ts, metric_type) {
            Ok(metric) => {
                if self.trace() {
                    println!("> {}", metric);
                }
                self.count_event();
                Some(Event::Metric(metric))
            }
            Err(e) => {
                tracing::warn!(metric = %name, error = %e, "error adding metric");
                None
            }
        }
    }

    fn make_log_line(
        &self,
        path: &str,
        content: &str,
        mut tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
    ) -> Option<Event> {
        self.merge_default_tags(&mut tags);

        match LogLine::new(path, content, tags, fields, ts) {
            Ok(logline) => {
                if self.trace() {
                    println!("> {}", logline);
                }
                self.count_event();
                Some(Event::LogLine(logline))
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "error adding logline");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "running_source_test.rs"]
mod running_source_test;
