//! Running processor node

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use optic_core::event::Tags;
use optic_core::{Event, Processor};
use optic_selfmetric::{self as selfmetric, Counter};

use crate::forward::{forward_fn, ForwardFn};
use crate::running_sink::RunningSink;

/// Node configuration for a processor.
pub struct ProcessorNodeConfig {
    /// Registry kind of the plugin
    pub kind: String,
    /// Configured name, unique among processors
    pub name: String,
    /// Downstream processors
    pub forward_processors: Vec<Arc<RunningProcessor>>,
    /// Downstream sinks
    pub forward_sinks: Vec<Arc<RunningSink>>,
}

/// A configured processor in the running pipeline.
pub struct RunningProcessor {
    processor: Box<dyn Processor>,
    /// Node configuration
    pub config: ProcessorNodeConfig,
    forward: ForwardFn,
    events_processed: Counter,
    events_filtered: Counter,
}

impl std::fmt::Debug for RunningProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningProcessor")
            .field("name", &self.config.name)
            .finish()
    }
}

impl RunningProcessor {
    /// Wrap a processor plugin. The plugin must already be initialized.
    pub fn new(processor: Box<dyn Processor>, config: ProcessorNodeConfig) -> Arc<Self> {
        let mut tags = Tags::new();
        tags.insert("processor".into(), config.name.clone());

        let name = format!("processors.{}", config.name);
        let forward = forward_fn(&name, &config.forward_processors, &config.forward_sinks);

        Arc::new(Self {
            processor,
            events_processed: selfmetric::get_or_register_counter(
                "processor",
                "events_processed",
                tags.clone(),
            ),
            events_filtered: selfmetric::get_or_register_counter(
                "processor",
                "events_filtered",
                tags,
            ),
            config,
            forward,
        })
    }

    /// Pipeline identity of this node.
    pub fn name(&self) -> String {
        format!("processors.{}", self.config.name)
    }

    /// Apply the plugin, counting inputs and the in/out difference as
    /// filtered.
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        let n_in = events.len() as i64;
        let out = self.processor.apply(events);
        self.events_processed.inc(n_in);
        self.events_filtered.inc(n_in - out.len() as i64);
        out
    }

    /// Apply self to a single event and forward the results downstream.
    pub async fn forward_event(&self, event: Event) {
        let events = self.apply(vec![event]);
        for event in events {
            (self.forward)(event).await;
        }
    }

    /// Flush buffered state: apply with an empty input, letting a stateful
    /// plugin emit what it holds. Outputs are forwarded; with none, the
    /// flush recurses into downstream processors.
    pub fn flush(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let events = self.apply(Vec::new());
            if events.is_empty() {
                for processor in &self.config.forward_processors {
                    processor.flush().await;
                }
                return;
            }
            for event in events {
                (self.forward)(event).await;
            }
        })
    }
}
