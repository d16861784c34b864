//! The forward function: per-node downstream dispatch
//!
//! Built once per node from its configured downstream processors and sinks.
//! Dispatch cases, in order:
//!
//! 1. zero downstreams — no-op, logged once at construction
//! 2. exactly one downstream — call directly, no copy
//! 3. processors and sinks — copy for every processor, copy for every sink
//!    except the last, which receives the original
//! 4. only processors or only sinks — copy for all but the last
//!
//! The deep-copy contract guarantees each fan-out recipient an event whose
//! tag and field maps share no storage with any other recipient's.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use optic_core::Event;

use crate::running_processor::RunningProcessor;
use crate::running_sink::RunningSink;

/// Boxed future returned by a forward dispatch.
pub type ForwardFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Dispatch closure routing one event to a node's downstreams.
///
/// The `dyn Fn` indirection is also what lets processor graphs recurse:
/// a processor's forward function may call into further processors without
/// the compiler having to name an infinite future type.
pub type ForwardFn = Arc<dyn Fn(Event) -> ForwardFuture + Send + Sync>;

/// Build the forward function for a node from its downstream lists.
pub fn forward_fn(
    name: &str,
    processors: &[Arc<RunningProcessor>],
    sinks: &[Arc<RunningSink>],
) -> ForwardFn {
    match (processors.len(), sinks.len()) {
        (0, 0) => {
            tracing::info!(node = %name, "node will not forward events anywhere");
            Arc::new(|_event| Box::pin(async {}))
        }
        (1, 0) => {
            let processor = processors[0].clone();
            Arc::new(move |event| {
                let processor = processor.clone();
                Box::pin(async move { processor.forward_event(event).await })
            })
        }
        (0, 1) => {
            let sink = sinks[0].clone();
            Arc::new(move |event| {
                let sink = sink.clone();
                Box::pin(async move { sink.write_event(event).await })
            })
        }
        _ => {
            let processors = processors.to_vec();
            let sinks = sinks.to_vec();
            Arc::new(move |event| {
                let processors = processors.clone();
                let sinks = sinks.clone();
                Box::pin(async move { fan_out(event, &processors, &sinks).await })
            })
        }
    }
}

async fn fan_out(
    event: Event,
    processors: &[Arc<RunningProcessor>],
    sinks: &[Arc<RunningSink>],
) {
    if let Some((last, rest)) = sinks.split_last() {
        // every processor gets a copy, the last sink takes the original
        for processor in processors {
            processor.forward_event(event.clone()).await;
        }
        for sink in rest {
            sink.write_event(event.clone()).await;
        }
        last.write_event(event).await;
    } else if let Some((last, rest)) = processors.split_last() {
        for processor in rest {
            processor.forward_event(event.clone()).await;
        }
        last.forward_event(event).await;
    }
}

#[cfg(test)]
#[path = "forward_test.rs"]
mod forward_test;
