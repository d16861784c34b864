//! Optic - Agent
//!
//! The agent runtime: one gatherer per configured source, each running a
//! collector loop, an event-processing loop, and a flusher, all sharing a
//! cancellation token for shutdown.
//!
//! # Lifecycle
//!
//! ```text
//! connect → run(shutdown) → close
//!             │
//!             ├── per source: gatherer
//!             │     ├── collector loop   (jitter → gather → tick)
//!             │     ├── event loop       (channel → processor chain → forward)
//!             │     └── flusher          (tick → single-flight flush)
//!             └── service sources started once, stopped at shutdown
//! ```
//!
//! Shutdown drains each source's event channel, runs one final flush per
//! flusher, then closes the sinks.

mod agent;
mod error;
mod flusher;
mod gatherer;
mod jitter;

pub use agent::Agent;
pub use error::AgentError;
