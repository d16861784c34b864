//! Discard sink

use async_trait::async_trait;

use optic_core::{Event, Plugin, PluginResult, Sink};

use crate::PluginTable;

const KIND: &str = "discard";
const DESCRIPTION: &str = "Discards all received events.";

/// Drops every event it is given. Useful for benchmarking and as a pipeline
/// terminator.
#[derive(Debug, Default)]
pub struct DiscardSink;

pub(super) fn create(_config: &PluginTable) -> PluginResult<Box<dyn Sink>> {
    Ok(Box::new(DiscardSink))
}

impl Plugin for DiscardSink {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }
}

#[async_trait]
impl Sink for DiscardSink {
    async fn connect(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn close(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn write(&self, _events: &[Event]) -> PluginResult<()> {
        Ok(())
    }
}
