//! Accumulator interface: how sources emit events
//!
//! The accumulator enriches events with default tags and self-metrics and
//! places them on the owning source's event channel. Sends await channel
//! capacity, so a source that outruns its own pipeline slows down rather
//! than dropping events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PluginError;
use crate::event::{Event, Fields, MetricType, Tags};

/// Interface sources use to emit events into the pipeline.
///
/// When `ts` is `None`, the accumulator stamps the event with "now" rounded
/// to its precision. Events failing validation are silently dropped (a
/// warning is logged by the maker); errors never block the source.
#[async_trait]
pub trait Accumulator: Send + Sync {
    /// Emit a pre-built event unchanged.
    async fn add_event(&self, event: Event);

    /// Emit a raw byte payload.
    async fn add_raw(
        &self,
        source: &str,
        value: &[u8],
        tags: Tags,
        fields: Fields,
        ts: Option<DateTime<Utc>>,
    );

    /// Emit an untyped metric.
    async fn add_metric(
        &self,
        name: &str,
        tags: Tags,
        fields: Fields,
        ts: Option<DateTime<Utc>>,
    );

    /// Emit a metric with an explicit type.
    async fn add_metric_type(
        &self,
        name: &str,
        tags: Tags,
        fields: Fields,
        metric_type: MetricType,
        ts: Option<DateTime<Utc>>,
    );

    /// Emit a log line.
    async fn add_log_line(
        &self,
        path: &str,
        content: &str,
        tags: Tags,
        fields: Fields,
        ts: Option<DateTime<Utc>>,
    );

    /// Report a runtime error. It is tagged with the plugin name, logged,
    /// and counted; never fatal.
    fn add_error(&self, err: PluginError);
}
