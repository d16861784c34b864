//! Pipeline graph builder
//!
//! Plugins reference one another by name and appear in the configuration
//! in no particular order, so the builder works from a queue: an entry
//! whose references cannot be resolved yet is requeued with an attempt
//! counter. An entry exhausting its attempts means the references form a
//! cycle; a wall-clock guard bounds the whole build.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use toml::value::Table;

use optic_pipeline::{
    ProcessorNodeConfig, RunningProcessor, RunningSink, RunningSource, SinkNodeConfig,
    SourceNodeConfig,
};

use crate::error::{ConfigError, Result};
use crate::registries::Registries;
use crate::Config;

const MAX_BUILD_ATTEMPTS: u8 = 4;
const BUILD_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PluginType {
    Source,
    Processor,
    Sink,
}

impl PluginType {
    fn as_str(self) -> &'static str {
        match self {
            PluginType::Source => "source",
            PluginType::Processor => "processor",
            PluginType::Sink => "sink",
        }
    }
}

pub(crate) struct PluginEntry {
    pub plugin_type: PluginType,
    pub name: String,
    pub table: Table,
    build_attempts: u8,
}

impl PluginEntry {
    pub fn new(plugin_type: PluginType, name: String, table: Table) -> Self {
        Self { plugin_type, name, table, build_attempts: 0 }
    }
}

/// Drain the queue, building every plugin and requeueing entries whose
/// references are not resolvable yet.
pub(crate) fn build_plugins(
    config: &mut Config,
    registries: &Registries,
    entries: Vec<PluginEntry>,
) -> Result<()> {
    let mut queue: VecDeque<PluginEntry> = entries.into();
    let started = Instant::now();

    while let Some(mut entry) = queue.pop_front() {
        if started.elapsed() >= BUILD_TIMEOUT {
            return Err(ConfigError::BuildTimeout { remaining: queue.len() + 1 });
        }

        let result = match entry.plugin_type {
            PluginType::Source => add_source(config, registries, &entry),
            PluginType::Processor => add_processor(config, registries, &entry),
            PluginType::Sink => add_sink(config, registries, &entry),
        };

        match result {
            Ok(()) => {}
            Err(ConfigError::ReferenceNotFound { reference }) => {
                if entry.build_attempts > MAX_BUILD_ATTEMPTS {
                    return Err(ConfigError::CircularReference { reference });
                }
                entry.build_attempts += 1;
                tracing::trace!(
                    plugin = %entry.name,
                    reference = %reference,
                    attempt = entry.build_attempts,
                    "required plugin not built yet, requeueing"
                );
                queue.push_back(entry);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn add_source(config: &mut Config, registries: &Registries, entry: &PluginEntry) -> Result<()> {
    let name = &entry.name;
    if config.sources.contains_key(name) {
        return Err(ConfigError::DuplicateName { plugin_type: "source", name: name.clone() });
    }

    let mut table = entry.table.clone();
    let kind = take_kind(&mut table, PluginType::Source, name)?;

    tracing::trace!(source = %name, kind = %kind, "building source config");

    // interval - OPTIONAL
    let interval = match table.remove("interval") {
        Some(value) => Some(parse_duration_value(&value).map_err(|message| {
            ConfigError::InvalidOption {
                plugin_type: "source",
                name: name.clone(),
                option: "interval",
                message,
            }
        })?),
        None => None,
    };

    // tags - OPTIONAL
    let tags = match table.remove("tags") {
        Some(toml::Value::Table(tag_table)) => {
            let mut tags = optic_core::event::Tags::new();
            for (k, v) in tag_table {
                match v {
                    toml::Value::String(s) => {
                        tags.insert(k, s);
                    }
                    other => {
                        return Err(ConfigError::InvalidOption {
                            plugin_type: "source",
                            name: name.clone(),
                            option: "tags",
                            message: format!("tag '{}' is not a string: {}", k, other),
                        })
                    }
                }
            }
            tags
        }
        Some(other) => {
            return Err(ConfigError::InvalidOption {
                plugin_type: "source",
                name: name.clone(),
                option: "tags",
                message: format!("expected a table, got: {}", other),
            })
        }
        None => optic_core::event::Tags::new(),
    };

    // processors - OPTIONAL, ordered chain applied before forwarding
    let mut processors = Vec::new();
    for reference in take_name_list(&mut table, "processors", PluginType::Source, name)? {
        match config.processors.get(&reference) {
            Some(processor) => processors.push(processor.clone()),
            None => return Err(ConfigError::ReferenceNotFound { reference }),
        }
    }

    // forwards - REQUIRED
    if !table.contains_key("forwards") {
        return Err(ConfigError::MissingForwards { name: name.clone() });
    }
    let (forward_processors, forward_sinks) =
        resolve_forwards(config, &mut table, PluginType::Source, name)?;

    // codec - OPTIONAL
    let decoder = match table.remove("codec") {
        Some(toml::Value::Table(codec_table)) => Some(
            registries
                .codecs
                .new_decoder(&codec_table)
                .map_err(|source| ConfigError::Plugin {
                    plugin_type: "source",
                    name: name.clone(),
                    source,
                })?,
        ),
        Some(other) => {
            return Err(ConfigError::InvalidOption {
                plugin_type: "source",
                name: name.clone(),
                option: "codec",
                message: format!("expected a table, got: {}", other),
            })
        }
        None => None,
    };

    let mut source =
        registries
            .sources
            .create(&kind, &table)
            .map_err(|source| ConfigError::Plugin {
                plugin_type: "source",
                name: name.clone(),
                source,
            })?;

    if let Some(decoder) = decoder {
        source.set_decoder(decoder);
    }

    let running = RunningSource::new(
        source,
        SourceNodeConfig {
            kind,
            name: name.clone(),
            interval,
            tags,
            processors,
            forward_processors,
            forward_sinks,
        },
    );
    config.sources.insert(name.clone(), running);
    Ok(())
}

fn add_processor(config: &mut Config, registries: &Registries, entry: &PluginEntry) -> Result<()> {
    let name = &entry.name;
    if config.processors.contains_key(name) {
        return Err(ConfigError::DuplicateName { plugin_type: "processor", name: name.clone() });
    }

    let mut table = entry.table.clone();
    let kind = take_kind(&mut table, PluginType::Processor, name)?;

    tracing::trace!(processor = %name, kind = %kind, "building processor config");

    // forwards - OPTIONAL
    let (forward_processors, forward_sinks) =
        resolve_forwards(config, &mut table, PluginType::Processor, name)?;

    let mut processor =
        registries
            .processors
            .create(&kind, &table)
            .map_err(|source| ConfigError::Plugin {
                plugin_type: "processor",
                name: name.clone(),
                source,
            })?;

    processor.init().map_err(|source| ConfigError::Plugin {
        plugin_type: "processor",
        name: name.clone(),
        source,
    })?;

    let running = RunningProcessor::new(
        processor,
        ProcessorNodeConfig {
            kind,
            name: name.clone(),
            forward_processors,
            forward_sinks,
        },
    );
    config.processors.insert(name.clone(), running);
    Ok(())
}

fn add_sink(config: &mut Config, registries: &Registries, entry: &PluginEntry) -> Result<()> {
    let name = &entry.name;
    if config.sinks.contains_key(name) {
        return Err(ConfigError::DuplicateName { plugin_type: "sink", name: name.clone() });
    }

    let mut table = entry.table.clone();
    let kind = take_kind(&mut table, PluginType::Sink, name)?;

    tracing::trace!(sink = %name, kind = %kind, "building sink config");

    // batch_size - OPTIONAL
    let batch_size = match table.remove("batch_size") {
        Some(toml::Value::Integer(n)) if n > 0 => n as usize,
        Some(other) => {
            return Err(ConfigError::InvalidOption {
                plugin_type: "sink",
                name: name.clone(),
                option: "batch_size",
                message: format!("expected a positive integer, got: {}", other),
            })
        }
        None => 0, // the running sink applies the default
    };

    // buffer - OPTIONAL, defaults to an in-memory buffer
    let buffer = match table.remove("buffer") {
        Some(toml::Value::Table(buffer_table)) => registries
            .buffers
            .from_config(&buffer_table)
            .map_err(|source| ConfigError::Plugin {
                plugin_type: "sink",
                name: name.clone(),
                source,
            })?,
        Some(other) => {
            return Err(ConfigError::InvalidOption {
                plugin_type: "sink",
                name: name.clone(),
                option: "buffer",
                message: format!("expected a table, got: {}", other),
            })
        }
        None => {
            tracing::debug!(sink = %name, kind = %kind, "using default buffer");
            registries.buffers.default_buffer().map_err(|source| ConfigError::Plugin {
                plugin_type: "sink",
                name: name.clone(),
                source,
            })?
        }
    };

    // codec - OPTIONAL
    let encoder = match table.remove("codec") {
        Some(toml::Value::Table(codec_table)) => Some(
            registries
                .codecs
                .new_encoder(&codec_table)
                .map_err(|source| ConfigError::Plugin {
                    plugin_type: "sink",
                    name: name.clone(),
                    source,
                })?,
        ),
        Some(other) => {
            return Err(ConfigError::InvalidOption {
                plugin_type: "sink",
                name: name.clone(),
                option: "codec",
                message: format!("expected a table, got: {}", other),
            })
        }
        None => None,
    };

    let sink = registries
        .sinks
        .create(&kind, &table)
        .map_err(|source| ConfigError::Plugin {
            plugin_type: "sink",
            name: name.clone(),
            source,
        })?;

    let running = RunningSink::new(
        sink,
        SinkNodeConfig { kind, name: name.clone(), batch_size },
        buffer,
        encoder,
    );
    config.sinks.insert(name.clone(), running);
    Ok(())
}

fn take_kind(table: &mut Table, plugin_type: PluginType, name: &str) -> Result<String> {
    match table.remove("kind") {
        Some(toml::Value::String(kind)) if !kind.is_empty() => Ok(kind),
        _ => Err(ConfigError::UndefinedKind {
            plugin_type: plugin_type.as_str(),
            name: name.to_string(),
        }),
    }
}

/// Resolve a `forwards` list into downstream processors and sinks.
/// Processors take precedence on a name collision.
fn resolve_forwards(
    config: &Config,
    table: &mut Table,
    plugin_type: PluginType,
    name: &str,
) -> Result<(Vec<std::sync::Arc<RunningProcessor>>, Vec<std::sync::Arc<RunningSink>>)> {
    let mut forward_processors = Vec::new();
    let mut forward_sinks = Vec::new();

    for reference in take_name_list(table, "forwards", plugin_type, name)? {
        if let Some(processor) = config.processors.get(&reference) {
            forward_processors.push(processor.clone());
            continue;
        }
        if let Some(sink) = config.sinks.get(&reference) {
            forward_sinks.push(sink.clone());
            continue;
        }
        return Err(ConfigError::ReferenceNotFound { reference });
    }

    Ok((forward_processors, forward_sinks))
}

fn take_name_list(
    table: &mut Table,
    option: &'static str,
    plugin_type: PluginType,
    name: &str,
) -> Result<Vec<String>> {
    match table.remove(option) {
        Some(toml::Value::Array(values)) => {
            let mut names = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    toml::Value::String(s) => names.push(s),
                    other => {
                        return Err(ConfigError::InvalidOption {
                            plugin_type: plugin_type.as_str(),
                            name: name.to_string(),
                            option,
                            message: format!("expected a name, got: {}", other),
                        })
                    }
                }
            }
            Ok(names)
        }
        Some(other) => Err(ConfigError::InvalidOption {
            plugin_type: plugin_type.as_str(),
            name: name.to_string(),
            option,
            message: format!("expected an array of names, got: {}", other),
        }),
        None => Ok(Vec::new()),
    }
}

/// Durations appear either as humantime strings ("10s") or as integer
/// seconds.
fn parse_duration_value(value: &toml::Value) -> std::result::Result<Duration, String> {
    match value {
        toml::Value::String(s) => {
            humantime::parse_duration(s).map_err(|e| format!("'{}': {}", s, e))
        }
        toml::Value::Integer(n) if *n >= 0 => Ok(Duration::from_secs(*n as u64)),
        other => Err(format!("expected a duration, got: {}", other)),
    }
}
