//! Agent lifecycle

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use optic_config::Config;
use optic_pipeline::{ChannelAccumulator, EventMaker, DEFAULT_EVENT_CHANNEL_CAPACITY};

use crate::error::AgentError;
use crate::gatherer;

const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(15);
const TEST_GATHER_GAP: Duration = Duration::from_millis(500);

/// The running agent: connects sinks, schedules gathers, flushes, and
/// shuts the pipeline down in order.
pub struct Agent {
    config: Arc<Config>,
}

impl Agent {
    /// Create an agent from a loaded configuration. Unless suppressed, the
    /// host name becomes the `host` global tag.
    pub fn new(mut config: Config) -> Result<Agent, AgentError> {
        if !config.agent.omit_hostname {
            if config.agent.hostname.is_empty() {
                let hostname = hostname::get()
                    .map_err(AgentError::Hostname)?
                    .to_string_lossy()
                    .to_string();
                config.agent.hostname = hostname;
            }
            config
                .tags
                .insert("host".into(), config.agent.hostname.clone());
        }

        Ok(Agent {
            config: Arc::new(config),
        })
    }

    /// The agent's configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Connect every configured sink. Service sinks are started first. A
    /// failed connect is retried once after a delay; a second failure
    /// aborts startup.
    pub async fn connect(&self) -> Result<(), AgentError> {
        for sink in self.config.sinks.values() {
            if let Some(service) = sink.as_service_sink() {
                service.start().await.map_err(|source| {
                    tracing::error!(sink = %sink.name(), "service for sink failed to start");
                    AgentError::SinkServiceStart { name: sink.name(), source }
                })?;
            }

            tracing::debug!(sink = %sink.name(), "attempting connection to sink");
            if let Err(e) = sink.connect().await {
                tracing::error!(
                    sink = %sink.name(),
                    error = %e,
                    retry_in = ?CONNECT_RETRY_DELAY,
                    "failed to connect to sink, retrying"
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                sink.connect().await.map_err(|source| AgentError::SinkConnect {
                    name: sink.name(),
                    source,
                })?;
            }
            tracing::debug!(sink = %sink.name(), "successfully connected to sink");
        }
        Ok(())
    }

    /// One-shot mode: gather from every non-service source twice (some
    /// sources need two samples) and echo the events to stdout.
    pub async fn test(&self) -> Result<(), AgentError> {
        let (tx, mut rx) = mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);

        // drain the channel so gathers never block on it
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        for source in self.config.sources.values() {
            if source.as_service_source().is_some() {
                println!(
                    "\nWARNING: skipping plugin [[{}]]: service sources not supported in test mode",
                    source.name()
                );
                continue;
            }

            let maker: Arc<dyn EventMaker> = source.clone();
            let acc = ChannelAccumulator::new(maker, tx.clone());
            source.set_trace(true);
            source.set_default_tags(self.config.tags.clone());

            println!("* Plugin: {}, Collection 1", source.name());
            if let Some(interval) = source.config.interval {
                println!("* Interval: {:?}", interval);
            }
            source.gather(&acc).await.map_err(|source_err| AgentError::TestGather {
                name: source.name(),
                source: source_err,
            })?;

            // some sources need two samples, e.g. to compute usage deltas
            tokio::time::sleep(TEST_GATHER_GAP).await;
            println!("* Plugin: {}, Collection 2", source.name());
            source.gather(&acc).await.map_err(|source_err| AgentError::TestGather {
                name: source.name(),
                source: source_err,
            })?;
        }

        drop(tx);
        let _ = drain.await;
        Ok(())
    }

    /// Run the agent until the shutdown token fires: start service
    /// sources, spawn one gatherer per source, wait for them all, then
    /// close the sinks.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), AgentError> {
        tracing::info!(
            interval = ?self.config.agent.interval,
            flush_interval = ?self.config.agent.flush_interval,
            hostname = %self.config.agent.hostname,
            "agent starting"
        );

        for source in self.config.sources.values() {
            source.set_default_tags(self.config.tags.clone());
        }

        let mut started_services = Vec::new();
        for source in self.config.sources.values() {
            if let Some(service) = source.as_service_source() {
                let maker: Arc<dyn EventMaker> = source.clone();
                let acc = Arc::new(ChannelAccumulator::new(maker, source.events_sender()));
                service.start(acc).await.map_err(|source_err| {
                    tracing::error!(source = %source.name(), "service for source failed to start");
                    AgentError::SourceServiceStart { name: source.name(), source: source_err }
                })?;
                started_services.push(source.clone());
            }
        }

        let mut gatherers = Vec::with_capacity(self.config.sources.len());
        for source in self.config.sources.values() {
            let interval = source.config.interval.unwrap_or(self.config.agent.interval);
            gatherers.push((
                source.name(),
                tokio::spawn(gatherer::run(
                    self.config.clone(),
                    source.clone(),
                    interval,
                    shutdown.clone(),
                )),
            ));
        }

        for (name, handle) in gatherers {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(source = %name, "gatherer panicked");
                }
            }
        }

        for source in started_services {
            if let Some(service) = source.as_service_source() {
                service.stop();
            }
        }

        self.close().await;
        Ok(())
    }

    /// Close every sink and stop sink services.
    pub async fn close(&self) {
        for sink in self.config.sinks.values() {
            if let Err(e) = sink.close().await {
                tracing::error!(sink = %sink.name(), error = %e, "error closing sink");
            }
            if let Some(service) = sink.as_service_sink() {
                service.stop();
            }
        }
    }
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod agent_test;
