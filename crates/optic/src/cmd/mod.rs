//! Command implementations

pub mod run;

use anyhow::{bail, Result};
use optic_config::Config;

/// Checks shared by the run and test commands.
pub(crate) fn validate(config: &Config) -> Result<()> {
    if config.sources.is_empty() {
        bail!("no sources found, did you provide a valid config file?");
    }
    if config.sinks.is_empty() {
        bail!("no sinks found, did you provide a valid config file?");
    }
    if config.agent.interval.is_zero() {
        bail!("agent interval must be positive");
    }
    if config.agent.flush_interval.is_zero() {
        bail!("agent flush_interval must be positive");
    }
    Ok(())
}
