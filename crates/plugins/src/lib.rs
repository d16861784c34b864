//! Optic - Plugins
//!
//! Named factory registries for every plugin kind, plus the built-in
//! plugins the agent ships with:
//!
//! - buffer `memory` — bounded in-memory queue, drop-from-head overflow
//! - codec `line` — newline-delimited payloads; parses the metric line
//!   protocol back into metrics
//! - processors `noop`, `printer`
//! - sinks `discard`, `file`
//! - source `internal` — the agent's own self-metrics
//!
//! # Registries
//!
//! Each kind has a registry mapping a `kind` string to a creator function.
//! Creators receive the plugin's configuration table (everything under the
//! plugin's TOML section that the graph builder did not consume) and
//! deserialize their own typed config from it.
//!
//! ```
//! use optic_core::Buffer;
//! use optic_plugins::{buffers, PluginTable};
//!
//! let registry = buffers::defaults();
//! let buffer = registry.create("memory", &PluginTable::new()).unwrap();
//! assert_eq!(buffer.cap(), 1000);
//! ```

pub mod buffers;
pub mod codecs;
pub mod processors;
pub mod sinks;
pub mod sources;

use serde::de::DeserializeOwned;

use optic_core::PluginError;

/// Raw configuration table handed to plugin creators.
pub type PluginTable = toml::value::Table;

/// Deserialize a typed plugin config from its configuration table.
pub(crate) fn from_table<T: DeserializeOwned>(table: &PluginTable) -> Result<T, PluginError> {
    toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e| PluginError::config(e.to_string()))
}
