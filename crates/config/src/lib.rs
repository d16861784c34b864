//! Optic - Configuration
//!
//! TOML configuration loading and pipeline graph building.
//!
//! A configuration has a typed `[agent]` section, a `[global_tags]` table,
//! and one section per plugin instance (`[sources.<name>]`,
//! `[processors.<name>]`, `[sinks.<name>]`). Plugins reference one another
//! by name through `forwards` and `processors` lists; the graph builder
//! tolerates forward references by requeueing entries until their targets
//! exist.
//!
//! # Example
//!
//! ```
//! use std::str::FromStr;
//! use optic_config::Config;
//!
//! let config = Config::from_str(r#"
//! [sources.self]
//! kind = "internal"
//! forwards = ["out"]
//!
//! [sinks.out]
//! kind = "discard"
//! "#).unwrap();
//! assert_eq!(config.sources.len(), 1);
//! ```

mod builder;
mod env;
mod error;
mod registries;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use optic_core::event::Tags;
use optic_pipeline::{RunningProcessor, RunningSink, RunningSource};

use builder::{PluginEntry, PluginType};

pub use error::{ConfigError, Result};
pub use registries::Registries;

/// Agent-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Number of runtime worker threads; unset means the platform default
    pub thread_count: Option<usize>,

    /// Default gather period
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Maximum random sleep before each gather. Spreads plugins that poll
    /// shared resources like sysfs across the interval.
    #[serde(with = "humantime_serde")]
    pub collection_jitter: Duration,

    /// Sink flush period. Should not be set below `interval`.
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Maximum random sleep before each flush. Spreads write spikes across
    /// fleets of agents.
    #[serde(with = "humantime_serde")]
    pub flush_jitter: Duration,

    /// Override the reported hostname; empty means the OS hostname
    pub hostname: String,

    /// Suppress the `host` global tag entirely
    pub omit_hostname: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            thread_count: None,
            interval: Duration::from_secs(10),
            collection_jitter: Duration::ZERO,
            flush_interval: Duration::from_secs(10),
            flush_jitter: Duration::ZERO,
            hostname: String::new(),
            omit_hostname: false,
        }
    }
}

/// A loaded configuration: agent settings, global tags, and the built
/// pipeline graph.
#[derive(Default, Debug)]
pub struct Config {
    /// Global tags applied to every event
    pub tags: Tags,

    /// Agent-level settings
    pub agent: AgentConfig,

    /// Running sources by name
    pub sources: HashMap<String, Arc<RunningSource>>,

    /// Running processors by name
    pub processors: HashMap<String, Arc<RunningProcessor>>,

    /// Running sinks by name
    pub sinks: HashMap<String, Arc<RunningSink>>,
}

impl Config {
    /// Load a configuration file, falling back to the default locations
    /// when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        tracing::info!(config = %path.display(), "using config file");
        Self::from_file(&path)
    }

    /// Load a configuration from a file.
    pub fn from_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        contents.parse()
    }

    /// Parse a configuration with custom registries.
    pub fn parse_with(s: &str, registries: &Registries) -> Result<Config> {
        let mut root: toml::Value = toml::from_str(s)?;
        env::substitute_env(&mut root);

        let root = match root {
            toml::Value::Table(table) => table,
            _ => {
                return Err(ConfigError::InvalidSection {
                    section: "root".into(),
                    message: "configuration is not a table".into(),
                })
            }
        };

        let mut config = Config::default();

        if let Some(agent) = root.get("agent") {
            config.agent = agent.clone().try_into().map_err(ConfigError::Parse)?;
        }

        if let Some(tags) = root.get("global_tags") {
            config.tags = tags.clone().try_into().map_err(ConfigError::Parse)?;
        }

        let mut entries = Vec::new();
        for (section, plugin_type) in [
            ("sources", PluginType::Source),
            ("processors", PluginType::Processor),
            ("sinks", PluginType::Sink),
        ] {
            let Some(value) = root.get(section) else { continue };
            let table = value.as_table().ok_or_else(|| ConfigError::InvalidSection {
                section: section.into(),
                message: "expected a table of named plugins".into(),
            })?;

            for (name, plugin_value) in table {
                let plugin_table =
                    plugin_value.as_table().ok_or_else(|| ConfigError::InvalidSection {
                        section: format!("{}.{}", section, name),
                        message: "expected a plugin table".into(),
                    })?;
                entries.push(PluginEntry::new(plugin_type, name.clone(), plugin_table.clone()));
            }
        }

        builder::build_plugins(&mut config, registries, entries)?;

        Ok(config)
    }

    /// Names of the configured sources, in pipeline identity form.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.values().map(|s| s.name()).collect()
    }

    /// Names of the configured processors, in pipeline identity form.
    pub fn processor_names(&self) -> Vec<String> {
        self.processors.values().map(|p| p.name()).collect()
    }

    /// Names of the configured sinks, in pipeline identity form.
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.values().map(|s| s.name()).collect()
    }

    /// The global tags as a sorted `k=v` listing for logs.
    pub fn global_tags(&self) -> String {
        self.tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Config> {
        Config::parse_with(s, &Registries::defaults())
    }
}

/// Parse only the `[agent]` section of a configuration file. The binary
/// needs `thread_count` before the async runtime exists.
pub fn load_agent_settings(path: &Path) -> Result<AgentConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let root: toml::Value = toml::from_str(&contents)?;
    match root.get("agent") {
        Some(agent) => agent.clone().try_into().map_err(ConfigError::Parse),
        None => Ok(AgentConfig::default()),
    }
}

/// Resolve the default configuration file location, in order:
/// `$OPTIC_CONFIG_PATH`, `$HOME/.optic/optic.conf`, `/etc/optic/optic.conf`.
pub fn default_config_path() -> Result<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(env_path) = std::env::var("OPTIC_CONFIG_PATH") {
        if !env_path.is_empty() {
            candidates.push(PathBuf::from(env_path));
        }
    }
    let home = std::env::var("HOME").unwrap_or_default();
    let home_file = PathBuf::from(home).join(".optic").join("optic.conf");
    let etc_file = PathBuf::from("/etc/optic/optic.conf");
    candidates.push(home_file.clone());
    candidates.push(etc_file.clone());

    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.clone());
        }
    }

    Err(ConfigError::NoConfigFile {
        home: home_file.display().to_string(),
        etc: etc_file.display().to_string(),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
