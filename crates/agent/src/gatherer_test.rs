//! Gatherer scheduling and timeout tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use optic_core::event::Fields;
use optic_core::{Accumulator, FieldValue, Plugin, PluginResult, Sink, Source};
use optic_pipeline::{RunningSink, SinkNodeConfig, SourceNodeConfig};
use optic_plugins::buffers::MemoryBuffer;

use super::*;

/// Source whose gather never returns.
struct HungSource;

impl Plugin for HungSource {
    fn kind(&self) -> &'static str {
        "hung"
    }
    fn description(&self) -> &'static str {
        "Never finishes gathering."
    }
}

#[async_trait]
impl Source for HungSource {
    async fn gather(&self, _acc: &dyn Accumulator) -> PluginResult<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Source emitting one metric per gather.
struct TickSource {
    gathers: Arc<AtomicUsize>,
}

impl Plugin for TickSource {
    fn kind(&self) -> &'static str {
        "tick"
    }
    fn description(&self) -> &'static str {
        "Emits one metric per gather."
    }
}

#[async_trait]
impl Source for TickSource {
    async fn gather(&self, acc: &dyn Accumulator) -> PluginResult<()> {
        let n = self.gathers.fetch_add(1, Ordering::SeqCst);
        let mut fields = Fields::new();
        fields.insert("value".into(), FieldValue::Int(n as i64));
        acc.add_metric("tick", Tags::new(), fields, None).await;
        Ok(())
    }
}

/// Sink capturing every event written to it.
struct CaptureSink {
    captured: Arc<StdMutex<Vec<Event>>>,
}

impl Plugin for CaptureSink {
    fn kind(&self) -> &'static str {
        "capture"
    }
    fn description(&self) -> &'static str {
        "Captures written events."
    }
}

#[async_trait]
impl Sink for CaptureSink {
    async fn connect(&self) -> PluginResult<()> {
        Ok(())
    }
    async fn close(&self) -> PluginResult<()> {
        Ok(())
    }
    async fn write(&self, events: &[Event]) -> PluginResult<()> {
        self.captured.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

fn capture_sink(name: &str) -> (Arc<RunningSink>, Arc<StdMutex<Vec<Event>>>) {
    let captured = Arc::new(StdMutex::new(Vec::new()));
    let sink = RunningSink::new(
        Box::new(CaptureSink { captured: captured.clone() }),
        SinkNodeConfig { kind: "capture".into(), name: name.into(), batch_size: 1 },
        Box::new(MemoryBuffer::with_limit(1000)),
        None,
    );
    (sink, captured)
}

fn running_source(
    name: &str,
    plugin: Box<dyn Source>,
    forward_sinks: Vec<Arc<RunningSink>>,
) -> Arc<RunningSource> {
    RunningSource::new(
        plugin,
        SourceNodeConfig {
            kind: "test".into(),
            name: name.into(),
            interval: None,
            tags: Tags::new(),
            processors: Vec::new(),
            forward_processors: Vec::new(),
            forward_sinks,
        },
    )
}

fn accumulator_for(source: &Arc<RunningSource>) -> Arc<ChannelAccumulator> {
    let maker: Arc<dyn EventMaker> = source.clone();
    Arc::new(ChannelAccumulator::new(maker, source.events_sender()))
}

#[tokio::test(start_paused = true)]
async fn gather_with_timeout_returns_promptly_on_shutdown() {
    let source = running_source("hung_shutdown", Box::new(HungSource), Vec::new());
    let acc = accumulator_for(&source);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(gather_with_timeout(
        source,
        acc,
        Duration::from_secs(10),
        shutdown.clone(),
    ));

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("gather_with_timeout did not return after shutdown")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn hung_gather_warns_once_per_interval_without_cancelling() {
    let event_errors =
        selfmetric::get_or_register_counter("agent", "event_errors", Tags::new());
    let before = event_errors.count();

    let source = running_source("hung_warns", Box::new(HungSource), Vec::new());
    let acc = accumulator_for(&source);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(gather_with_timeout(
        source,
        acc,
        Duration::from_secs(1),
        shutdown.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert!(event_errors.count() - before >= 3);

    // still running: the gather is never cancelled
    assert!(!handle.is_finished());

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failing_gather_reports_through_accumulator() {
    struct FailingSource;

    impl Plugin for FailingSource {
        fn kind(&self) -> &'static str {
            "failing"
        }
        fn description(&self) -> &'static str {
            "Always fails."
        }
    }

    #[async_trait]
    impl Source for FailingSource {
        async fn gather(&self, _acc: &dyn Accumulator) -> PluginResult<()> {
            Err(optic_core::PluginError::message("gather exploded"))
        }
    }

    let event_errors =
        selfmetric::get_or_register_counter("agent", "event_errors", Tags::new());
    let before = event_errors.count();

    let source = running_source("failing", Box::new(FailingSource), Vec::new());
    let acc = accumulator_for(&source);
    let shutdown = CancellationToken::new();

    gather_with_timeout(source, acc, Duration::from_secs(10), shutdown).await;
    assert_eq!(event_errors.count() - before, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn gatherer_collects_forwards_and_drains() {
    let (sink, captured) = capture_sink("gatherer_e2e");
    let gathers = Arc::new(AtomicUsize::new(0));
    let source = running_source(
        "ticker",
        Box::new(TickSource { gathers: gathers.clone() }),
        vec![sink],
    );

    let config = Arc::new(Config::default());
    let shutdown = CancellationToken::new();

    let task = tokio::spawn(run(
        config,
        source,
        Duration::from_millis(20),
        shutdown.clone(),
    ));

    // let a few collection intervals elapse
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("gatherer did not stop")
        .unwrap();

    assert!(gathers.load(Ordering::SeqCst) >= 2);

    // every gathered event reached the sink before shutdown completed
    let captured = captured.lock().unwrap();
    assert!(!captured.is_empty());
    assert!(captured[0].to_string().starts_with("tick"));
}
