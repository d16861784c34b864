//! Running sink batching and retry tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::Utc;
use optic_core::event::Fields;
use optic_core::{FieldValue, Metric, MetricType, Plugin, PluginError};
use optic_plugins::buffers::MemoryBuffer;

use super::*;

/// Sink recording every batch size it is handed; optionally failing.
struct RecordingSink {
    batches: Arc<StdMutex<Vec<usize>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingSink {
    fn new() -> (Self, Arc<StdMutex<Vec<usize>>>, Arc<AtomicBool>) {
        let batches = Arc::new(StdMutex::new(Vec::new()));
        let fail = Arc::new(AtomicBool::new(false));
        let sink = Self {
            batches: batches.clone(),
            fail: fail.clone(),
        };
        (sink, batches, fail)
    }
}

impl Plugin for RecordingSink {
    fn kind(&self) -> &'static str {
        "recording"
    }
    fn description(&self) -> &'static str {
        "Records batch sizes for assertions."
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn connect(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn close(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn write(&self, events: &[Event]) -> PluginResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PluginError::message("sink unavailable"));
        }
        self.batches.lock().unwrap().push(events.len());
        Ok(())
    }
}

fn event(n: i64) -> Event {
    let mut fields = Fields::new();
    fields.insert("value".into(), FieldValue::Int(n));
    Event::Metric(
        Metric::new("sinktest", Tags::new(), fields, Utc::now(), MetricType::Untyped).unwrap(),
    )
}

fn running_sink(
    name: &str,
    batch_size: usize,
    buffer_cap: usize,
) -> (Arc<RunningSink>, Arc<StdMutex<Vec<usize>>>, Arc<AtomicBool>) {
    let (plugin, batches, fail) = RecordingSink::new();
    let sink = RunningSink::new(
        Box::new(plugin),
        SinkNodeConfig {
            kind: "recording".into(),
            name: name.into(),
            batch_size,
        },
        Box::new(MemoryBuffer::with_limit(buffer_cap)),
        None,
    );
    (sink, batches, fail)
}

#[tokio::test]
async fn write_event_grows_buffer_by_one() {
    let _guard = selfmetric::test_lock();
    let (sink, _, _) = running_sink("grow_one", 1000, 10_000);

    assert_eq!(sink.buffer_len().await, 0);
    sink.write_event(event(1)).await;
    assert_eq!(sink.buffer_len().await, 1);
    sink.write_event(event(2)).await;
    assert_eq!(sink.buffer_len().await, 2);
}

#[tokio::test]
async fn batches_of_batch_size_then_remainder() {
    let _guard = selfmetric::test_lock();
    let (sink, batches, _) = running_sink("batch_sizes", 1000, 10_000);

    for i in 0..3500 {
        sink.write_event(event(i)).await;
    }
    // the three full batches were flushed as the buffer filled
    assert_eq!(sink.buffer_len().await, 500);

    // one flush tick drains the remainder
    sink.write().await.unwrap();
    assert_eq!(sink.buffer_len().await, 0);

    assert_eq!(batches.lock().unwrap().clone(), vec![1000, 1000, 1000, 500]);
    assert_eq!(sink.events_written.count(), 3500);
}

#[tokio::test]
async fn failed_writes_keep_events_for_retry() {
    let _guard = selfmetric::test_lock();
    let (sink, _, fail) = running_sink("never_succeeds", 1000, 1000);
    fail.store(true, Ordering::SeqCst);

    for i in 0..5000 {
        sink.write_event(event(i)).await;
    }

    // buffer stabilizes at capacity holding the most recent events
    assert_eq!(sink.buffer_len().await, 1000);
    sink.write().await.unwrap();
    assert_eq!(sink.buffer_len().await, 1000);
    assert_eq!(sink.events_written.count(), 0);

    let oldest = {
        let buffer = sink.buffer.lock().await;
        buffer.slice(0, 1)[0].clone()
    };
    assert_eq!(
        oldest.fields().get("value").and_then(|v| v.as_int()),
        Some(4000)
    );
}

#[tokio::test]
async fn recovery_after_failure_writes_retained_events() {
    let _guard = selfmetric::test_lock();
    let (sink, batches, fail) = running_sink("recovers", 100, 1000);
    fail.store(true, Ordering::SeqCst);

    for i in 0..50 {
        sink.write_event(event(i)).await;
    }
    sink.write().await.unwrap();
    assert_eq!(sink.buffer_len().await, 50);

    fail.store(false, Ordering::SeqCst);
    sink.write().await.unwrap();
    assert_eq!(sink.buffer_len().await, 0);
    assert_eq!(sink.events_written.count(), 50);
    assert_eq!(batches.lock().unwrap().clone(), vec![50]);
}

#[tokio::test]
async fn default_batch_size_applied() {
    let _guard = selfmetric::test_lock();
    let (sink, _, _) = running_sink("default_batch", 0, 100);
    assert_eq!(sink.config.batch_size, DEFAULT_EVENT_BATCH_SIZE);
}

#[tokio::test]
async fn concurrent_write_events_serialize_on_buffer() {
    let _guard = selfmetric::test_lock();
    let (sink, _, _) = running_sink("concurrent", 1000, 10_000);

    let mut handles = Vec::new();
    for task in 0..4 {
        let sink = sink.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..100 {
                sink.write_event(event(task * 100 + i)).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(sink.buffer_len().await, 400);
}
