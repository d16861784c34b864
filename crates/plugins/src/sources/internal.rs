//! Internal source: the agent's own statistics

use std::time::Instant;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;

use optic_core::event::{Fields, Tags};
use optic_core::{Accumulator, FieldValue, Plugin, PluginResult, Source};
use optic_selfmetric as selfmetric;

use crate::PluginTable;

const KIND: &str = "internal";
const DESCRIPTION: &str = "Collect statistics about itself.";

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

#[derive(Debug, Deserialize)]
#[serde(default)]
struct InternalConfig {
    collect_process_stats: bool,
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self { collect_process_stats: true }
    }
}

/// Emits one metric per self-metric grouping on every gather, plus basic
/// process statistics.
pub struct InternalSource {
    collect_process_stats: bool,
}

impl InternalSource {
    /// Source with process stats collection enabled.
    pub fn new() -> Self {
        Self { collect_process_stats: true }
    }
}

impl Default for InternalSource {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn create(config: &PluginTable) -> PluginResult<Box<dyn Source>> {
    let config: InternalConfig = crate::from_table(config)?;
    Ok(Box::new(InternalSource {
        collect_process_stats: config.collect_process_stats,
    }))
}

impl Plugin for InternalSource {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }
}

#[async_trait]
impl Source for InternalSource {
    async fn gather(&self, acc: &dyn Accumulator) -> PluginResult<()> {
        if self.collect_process_stats {
            let mut fields = Fields::new();
            fields.insert(
                "uptime_seconds".into(),
                FieldValue::Float(PROCESS_START.elapsed().as_secs_f64()),
            );
            acc.add_metric("internal_process", Tags::new(), fields, None).await;
        }

        for event in selfmetric::metrics() {
            if let Some(metric) = event.as_metric() {
                acc.add_metric(
                    metric.name(),
                    metric.tags().clone(),
                    metric.fields().clone(),
                    Some(metric.time()),
                )
                .await;
            }
        }

        Ok(())
    }
}
