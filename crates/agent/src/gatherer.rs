//! Per-source gather scheduling
//!
//! Each configured source gets one gatherer running three cooperating
//! loops: the collector (interval-driven gather with jitter), the event
//! loop (channel → per-source processor chain → forward), and the flusher.
//! All three share the shutdown token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use optic_config::Config;
use optic_core::event::Tags;
use optic_core::{Accumulator, Event, PluginError};
use optic_pipeline::{ChannelAccumulator, EventMaker, RunningSource};
use optic_selfmetric as selfmetric;

use crate::flusher;
use crate::jitter::random_sleep;

pub(crate) async fn run(
    config: Arc<Config>,
    source: Arc<RunningSource>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut tags = Tags::new();
    tags.insert("source".into(), source.config.name.clone());
    let gather_time =
        selfmetric::get_or_register_histogram("gather", "gather_time_nanoseconds", tags);

    let Some(events_rx) = source.take_events_receiver() else {
        tracing::error!(source = %source.name(), "event channel already taken, gatherer not started");
        return;
    };

    let (drained_tx, drained_rx) = watch::channel(false);

    let event_task = tokio::spawn(event_loop(
        source.clone(),
        events_rx,
        shutdown.clone(),
        drained_tx,
    ));
    let flusher_task = tokio::spawn(flusher::run(config.clone(), shutdown.clone(), drained_rx));

    // service sources are push-driven: no periodic gather
    if source.as_service_source().is_none() {
        let maker: Arc<dyn EventMaker> = source.clone();
        let acc = Arc::new(ChannelAccumulator::new(maker, source.events_sender()));

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            random_sleep(config.agent.collection_jitter, &shutdown).await;

            let started = Instant::now();
            gather_with_timeout(source.clone(), acc.clone(), interval, shutdown.clone()).await;
            gather_time.update(started.elapsed().as_nanos() as i64);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
        }
    } else {
        shutdown.cancelled().await;
    }

    // the event loop drains the channel, then the flusher runs the final
    // flush
    if let Err(e) = event_task.await {
        if e.is_panic() {
            tracing::error!(source = %source.name(), "event loop panicked");
        }
    }
    if let Err(e) = flusher_task.await {
        if e.is_panic() {
            tracing::error!(source = %source.name(), "flusher panicked");
        }
    }
}

/// Gather from the source, warning once per elapsed interval while the
/// gather is still running. The gather is never cancelled: re-calling a
/// hung source would pile up stuck tasks, so the single task is left to
/// finish (or leak, on shutdown).
pub(crate) async fn gather_with_timeout(
    source: Arc<RunningSource>,
    acc: Arc<ChannelAccumulator>,
    timeout: Duration,
    shutdown: CancellationToken,
) {
    let (done_tx, mut done_rx) = oneshot::channel();
    {
        let source = source.clone();
        let acc = acc.clone();
        tokio::spawn(async move {
            let result = source.gather(acc.as_ref()).await;
            let _ = done_tx.send(result);
        });
    }

    let mut ticker =
        tokio::time::interval_at(tokio::time::Instant::now() + timeout, timeout);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            result = &mut done_rx => {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => acc.add_error(e),
                    // the gather task panicked; only this source is affected
                    Err(_) => tracing::error!(source = %source.name(), "source panicked during gather"),
                }
                return;
            }
            _ = ticker.tick() => {
                acc.add_error(PluginError::message(format!(
                    "took longer to collect than collection interval ({:?})",
                    timeout
                )));
            }
            _ = shutdown.cancelled() => return,
        }
    }
}

async fn event_loop(
    source: Arc<RunningSource>,
    mut events: mpsc::Receiver<Event>,
    shutdown: CancellationToken,
    drained: watch::Sender<bool>,
) {
    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => process_event(&source, event).await,
                    None => break,
                }
            }
            _ = shutdown.cancelled() => {
                // sweep whatever is already buffered, then stop
                while let Ok(event) = events.try_recv() {
                    process_event(&source, event).await;
                }
                break;
            }
        }
    }
    let _ = drained.send(true);
}

/// Run one event through the per-source processor chain, then forward
/// every survivor. Each forward runs in its own task so a slow downstream
/// cannot block the event loop.
async fn process_event(source: &Arc<RunningSource>, event: Event) {
    let mut events = vec![event];
    for processor in &source.config.processors {
        events = processor.apply(events);
        if events.is_empty() {
            return;
        }
    }
    for event in events {
        let source = source.clone();
        tokio::spawn(async move {
            source.forward_event(event).await;
        });
    }
}

#[cfg(test)]
#[path = "gatherer_test.rs"]
mod gatherer_test;
