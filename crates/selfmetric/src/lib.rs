//! Optic - Self-metrics
//!
//! Process-global registry of the agent's own counters, gauges, and
//! histograms. Every pipeline component reports here; the `internal` source
//! drains the registry back into the pipeline as ordinary metric events.
//!
//! # Design
//!
//! - Metrics are grouped into **multi-metrics** by `(namespace, tags)`: one
//!   grouping may hold several fields of different kinds.
//! - `get_or_register_*` returns a cheap, cloneable handle backed by
//!   atomics; re-registering an existing field returns the same handle.
//!   Registering a field under a conflicting kind is a programming error
//!   and panics.
//! - Registration takes the registry mutex; increments and reads touch only
//!   per-handle atomics.
//!
//! # Example
//!
//! ```
//! use optic_selfmetric as selfmetric;
//! use std::collections::BTreeMap;
//!
//! let events = selfmetric::get_or_register_counter(
//!     "agent", "events_processed", BTreeMap::new());
//! events.inc(1);
//! ```

mod metrics;
mod registry;

pub use metrics::{Counter, Gauge, GaugeF64, Histogram};
pub use registry::{
    get_or_register_counter, get_or_register_gauge, get_or_register_gauge_f64,
    get_or_register_histogram, metrics, reset, test_lock,
};
