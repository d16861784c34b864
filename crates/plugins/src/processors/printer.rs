//! Printer processor

use optic_core::{Event, Plugin, PluginResult, Processor};

use crate::PluginTable;

const KIND: &str = "printer";
const DESCRIPTION: &str = "Print all events that pass through this processor.";

/// Prints every event to stdout and passes it through.
#[derive(Debug, Default)]
pub struct PrinterProcessor;

pub(super) fn create(_config: &PluginTable) -> PluginResult<Box<dyn Processor>> {
    Ok(Box::new(PrinterProcessor))
}

impl Plugin for PrinterProcessor {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }
}

impl Processor for PrinterProcessor {
    fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        for event in &events {
            println!("{}", event);
        }
        events
    }
}
