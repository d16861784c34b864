//! No-op processor

use optic_core::{Event, Plugin, PluginResult, Processor};

use crate::PluginTable;

const KIND: &str = "noop";
const DESCRIPTION: &str =
    "Noop is a no-op processor that does nothing, the events pass through unchanged.";

/// Passes events through unchanged.
#[derive(Debug, Default)]
pub struct NoopProcessor;

pub(super) fn create(_config: &PluginTable) -> PluginResult<Box<dyn Processor>> {
    Ok(Box::new(NoopProcessor))
}

impl Plugin for NoopProcessor {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }
}

impl Processor for NoopProcessor {
    fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use optic_core::event::{Fields, Tags};
    use optic_core::{FieldValue, Metric, MetricType};

    #[test]
    fn passes_events_through_unchanged() {
        let mut fields = Fields::new();
        fields.insert("value".into(), FieldValue::Int(1));
        let events: Vec<Event> = (0..3)
            .map(|_| {
                Event::Metric(
                    Metric::new("nooptest", Tags::new(), fields.clone(), Utc::now(), MetricType::Untyped)
                        .unwrap(),
                )
            })
            .collect();

        let p = NoopProcessor;
        let out = p.apply(events.clone());
        assert_eq!(out, events);
    }

    #[test]
    fn empty_input_stays_empty() {
        let p = NoopProcessor;
        assert!(p.apply(Vec::new()).is_empty());
    }
}
