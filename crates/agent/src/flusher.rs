//! Periodic sink flush orchestration
//!
//! One flusher runs per gatherer. Scheduled flushes are single-flight: a
//! single-permit semaphore is tried on every tick, and a tick arriving
//! while a flush is still running is skipped with a warning. On shutdown
//! the flusher waits for the source's event channel to drain, runs one
//! final flush, and returns.

use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use optic_config::Config;

use crate::jitter::random_sleep;

pub(crate) async fn run(
    config: Arc<Config>,
    shutdown: CancellationToken,
    mut drained: watch::Receiver<bool>,
) {
    let flush_interval = config.agent.flush_interval;

    // sleep one interval before the first scheduled flush
    tokio::select! {
        _ = tokio::time::sleep(flush_interval) => {}
        _ = shutdown.cancelled() => {}
    }

    let semaphore = Arc::new(Semaphore::new(1));
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("flushing any cached events before shutdown");
                // wait for the event loop to drain the channel before the
                // final flush
                let _ = drained.wait_for(|d| *d).await;
                flush(&config).await;
                return;
            }
            _ = ticker.tick() => {
                match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => {
                        let config = config.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            random_sleep(config.agent.flush_jitter, &shutdown).await;
                            flush(&config).await;
                            drop(permit);
                        });
                    }
                    Err(_) => {
                        tracing::warn!(
                            "skipping a scheduled flush because there is already a flush ongoing"
                        );
                    }
                }
            }
        }
    }
}

/// Flush the whole pipeline once: every processor's `flush` and every
/// sink's `write` run concurrently. Sink errors are logged and swallowed.
pub(crate) async fn flush(config: &Arc<Config>) {
    let mut handles = Vec::with_capacity(config.processors.len() + config.sinks.len());

    for processor in config.processors.values() {
        let processor = processor.clone();
        handles.push(tokio::spawn(async move {
            processor.flush().await;
        }));
    }

    for sink in config.sinks.values() {
        let sink = sink.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = sink.write().await {
                tracing::error!(sink = %sink.name(), error = %e, "error writing to sink");
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
#[path = "flusher_test.rs"]
mod flusher_test;
