//! The channel accumulator
//!
//! Sources receive a [`ChannelAccumulator`] wired to their owning source's
//! event channel. Event construction is delegated to the [`EventMaker`]
//! provided by the running source, which applies default tags, validates,
//! and maintains the processed counters. Events failing validation come
//! back as `None` and are silently dropped here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use tokio::sync::mpsc;

use optic_core::event::{Fields, Tags};
use optic_core::{Accumulator, Event, MetricType, PluginError};
use optic_selfmetric::{self as selfmetric, Counter};

/// Runtime errors reported by any plugin, process-wide.
pub(crate) static EVENT_ERRORS: Lazy<Counter> =
    Lazy::new(|| selfmetric::get_or_register_counter("agent", "event_errors", Tags::new()));

/// Builds events on behalf of an accumulator.
///
/// Implemented by `RunningSource`: applies plugin-level default tags, then
/// agent-level global tags (only where not already present), validates, and
/// increments the per-source and global `events_processed` counters. A
/// `None` result means the event failed validation and was dropped.
pub trait EventMaker: Send + Sync {
    /// Identity used when logging errors for this plugin.
    fn name(&self) -> String;

    /// Build a raw event.
    fn make_raw(
        &self,
        source: &str,
        value: &[u8],
        tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
    ) -> Option<Event>;

    /// Build a metric event.
    fn make_metric(
        &self,
        name: &str,
        tags: Tags,
        fields: Fields,
        metric_type: MetricType,
        ts: DateTime<Utc>,
    ) -> Option<Event>;

    /// Build a log line event.
    fn make_log_line(
        &self,
        path: &str,
        content: &str,
        tags: Tags,
        fields: Fields,
        ts: DateTime<Utc>,
    ) -> Option<Event>;
}

/// Accumulator writing to a bounded event channel.
///
/// Sends await channel capacity: a source that produces faster than its
/// pipeline consumes is slowed down, not dropped.
pub struct ChannelAccumulator {
    maker: Arc<dyn EventMaker>,
    events: mpsc::Sender<Event>,
    precision: Duration,
}

impl ChannelAccumulator {
    /// Accumulator with nanosecond precision.
    pub fn new(maker: Arc<dyn EventMaker>, events: mpsc::Sender<Event>) -> Self {
        Self {
            maker,
            events,
            precision: Duration::from_nanos(1),
        }
    }

    /// Accumulator rounding timestamps to the given precision.
    pub fn with_precision(
        maker: Arc<dyn EventMaker>,
        events: mpsc::Sender<Event>,
        precision: Duration,
    ) -> Self {
        Self { maker, events, precision }
    }

    fn timestamp(&self, ts: Option<DateTime<Utc>>) -> DateTime<Utc> {
        round_to_precision(ts.unwrap_or_else(Utc::now), self.precision)
    }

    async fn emit(&self, event: Event) {
        // a closed channel means the pipeline is shutting down
        if self.events.send(event).await.is_err() {
            tracing::trace!(plugin = %self.maker.name(), "event channel closed, dropping event");
        }
    }
}

fn round_to_precision(ts: DateTime<Utc>, precision: Duration) -> DateTime<Utc> {
    let p = precision.as_nanos() as i64;
    if p <= 1 {
        return ts;
    }
    let nanos = ts.timestamp_nanos_opt().unwrap_or(0);
    let rounded = ((nanos + p / 2).div_euclid(p)) * p;
    Utc.timestamp_nanos(rounded)
}

#[async_trait]
impl Accumulator for ChannelAccumulator {
    async fn add_event(&self, event: Event) {
        self.emit(event).await;
    }

    async fn add_raw(
        &self,
        source: &str,
        value: &[u8],
        tags: Tags,
        fields: Fields,
        ts: Option<DateTime<Utc>>,
    ) {
        let ts = self.timestamp(ts);
        if let Some(event) = self.maker.make_raw(source, value, tags, fields, ts) {
            self.emit(event).await;
        }
    }

    async fn add_metric(
        &self,
        name: &str,
        tags: Tags,
        fields: Fields,
        ts: Option<DateTime<Utc>>,
    ) {
        let ts = self.timestamp(ts);
        if let Some(event) = self.maker.make_metric(name, tags, fields, MetricType::Untyped, ts) {
            self.emit(event).await;
        }
    }

    async fn add_metric_type(
        &self,
        name: &str,
        tags: Tags,
        fields: Fields,
        metric_type: MetricType,
        ts: Option<DateTime<Utc>>,
    ) {
        let ts = self.timestamp(ts);
        if let Some(event) = self.maker.make_metric(name, tags, fields, metric_type, ts) {
            self.emit(event).await;
        }
    }

    async fn add_log_line(
        &self,
        path: &str,
        content: &str,
        tags: Tags,
        fields: Fields,
        ts: Option<DateTime<Utc>>,
    ) {
        let ts = self.timestamp(ts);
        if let Some(event) = self.maker.make_log_line(path, content, tags, fields, ts) {
            self.emit(event).await;
        }
    }

    fn add_error(&self, err: PluginError) {
        EVENT_ERRORS.inc(1);
        tracing::error!(plugin = %self.maker.name(), error = %err, "error in plugin");
    }
}

#[cfg(test)]
#[path = "accumulator_test.rs"]
mod accumulator_test;
