//! Configuration loading and graph building tests

use std::time::Instant;

use optic_selfmetric as selfmetric;

use super::*;

#[test]
fn empty_config_uses_defaults() {
    let config = Config::from_str("").unwrap();
    assert_eq!(config.agent.interval, Duration::from_secs(10));
    assert_eq!(config.agent.flush_interval, Duration::from_secs(10));
    assert_eq!(config.agent.collection_jitter, Duration::ZERO);
    assert!(config.agent.thread_count.is_none());
    assert!(!config.agent.omit_hostname);
    assert!(config.sources.is_empty());
    assert!(config.sinks.is_empty());
}

#[test]
fn agent_section_parses_durations() {
    let config = Config::from_str(
        r#"
[agent]
interval = "30s"
collection_jitter = "5s"
flush_interval = "1m"
flush_jitter = "500ms"
thread_count = 4
hostname = "collector-1"
omit_hostname = false
"#,
    )
    .unwrap();

    assert_eq!(config.agent.interval, Duration::from_secs(30));
    assert_eq!(config.agent.collection_jitter, Duration::from_secs(5));
    assert_eq!(config.agent.flush_interval, Duration::from_secs(60));
    assert_eq!(config.agent.flush_jitter, Duration::from_millis(500));
    assert_eq!(config.agent.thread_count, Some(4));
    assert_eq!(config.agent.hostname, "collector-1");
}

#[test]
fn global_tags_parsed_and_rendered() {
    let config = Config::from_str(
        r#"
[global_tags]
dc = "eu-1"
role = "edge"
"#,
    )
    .unwrap();

    assert_eq!(config.tags.get("dc").unwrap(), "eu-1");
    assert_eq!(config.global_tags(), "dc=eu-1 role=edge");
}

#[test]
fn full_pipeline_builds() {
    let _guard = selfmetric::test_lock();
    let config = Config::from_str(
        r#"
[sources.self]
kind = "internal"
interval = "5s"
tags = { origin = "self" }
forwards = ["out"]

[processors.pass]
kind = "noop"
forwards = ["out"]

[sinks.out]
kind = "discard"
batch_size = 500
"#,
    )
    .unwrap();

    assert_eq!(config.sources.len(), 1);
    assert_eq!(config.processors.len(), 1);
    assert_eq!(config.sinks.len(), 1);

    let source = &config.sources["self"];
    assert_eq!(source.name(), "sources.self");
    assert_eq!(source.config.interval, Some(Duration::from_secs(5)));
    assert_eq!(source.config.tags.get("origin").unwrap(), "self");
    assert_eq!(source.config.forward_sinks.len(), 1);
    assert_eq!(source.config.forward_sinks[0].name(), "sinks.out");

    assert_eq!(config.sinks["out"].config.batch_size, 500);
}

#[test]
fn forward_references_resolve_regardless_of_declaration_order() {
    let _guard = selfmetric::test_lock();
    // the sink is declared last yet both upstream references resolve
    let config = Config::from_str(
        r#"
[sources.a]
kind = "internal"
forwards = ["p"]

[processors.p]
kind = "noop"
forwards = ["s"]

[sinks.s]
kind = "discard"
"#,
    )
    .unwrap();

    let source = &config.sources["a"];
    assert_eq!(source.config.forward_processors.len(), 1);
    assert_eq!(source.config.forward_processors[0].name(), "processors.p");

    let processor = &config.processors["p"];
    assert_eq!(processor.config.forward_sinks.len(), 1);
    assert_eq!(processor.config.forward_sinks[0].name(), "sinks.s");
}

#[test]
fn circular_references_fail_within_guard() {
    let _guard = selfmetric::test_lock();
    let started = Instant::now();
    let err = Config::from_str(
        r#"
[processors.p1]
kind = "noop"
forwards = ["p2"]

[processors.p2]
kind = "noop"
forwards = ["p1"]
"#,
    )
    .unwrap_err();

    assert!(err.to_string().contains("possible circular reference"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn per_source_processor_chain_resolves() {
    let _guard = selfmetric::test_lock();
    let config = Config::from_str(
        r#"
[sources.chained]
kind = "internal"
processors = ["first", "second"]
forwards = ["out"]

[processors.first]
kind = "noop"

[processors.second]
kind = "noop"

[sinks.out]
kind = "discard"
"#,
    )
    .unwrap();

    let source = &config.sources["chained"];
    assert_eq!(source.config.processors.len(), 2);
    assert_eq!(source.config.processors[0].name(), "processors.first");
    assert_eq!(source.config.processors[1].name(), "processors.second");
}

#[test]
fn missing_kind_is_an_error() {
    let err = Config::from_str(
        r#"
[sources.anonymous]
forwards = []
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("undefined source kind"));
}

#[test]
fn unknown_kind_is_an_error() {
    let err = Config::from_str(
        r#"
[sources.mystery]
kind = "does_not_exist"
forwards = []
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("does_not_exist"));
}

#[test]
fn source_without_forwards_is_an_error() {
    let err = Config::from_str(
        r#"
[sources.isolated]
kind = "internal"
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("missing required option 'forwards'"));
}

#[test]
fn sink_buffer_and_codec_options() {
    let _guard = selfmetric::test_lock();
    let config = Config::from_str(
        r#"
[sources.self]
kind = "internal"
forwards = ["out"]

[sinks.out]
kind = "file"
files = ["stdout"]
buffer = { kind = "memory", limit = 250 }
codec = { kind = "line" }
"#,
    )
    .unwrap();

    assert_eq!(config.sinks.len(), 1);
}

#[test]
fn env_substitution_in_plugin_options() {
    let _guard = selfmetric::test_lock();
    std::env::set_var("OPTIC_CONFIG_TEST_PATH", "/tmp/optic-test.log");

    let config = Config::from_str(
        r#"
[sources.self]
kind = "internal"
tags = { logfile = "$OPTIC_CONFIG_TEST_PATH" }
forwards = ["out"]

[sinks.out]
kind = "discard"
"#,
    )
    .unwrap();

    let source = &config.sources["self"];
    assert_eq!(
        source.config.tags.get("logfile").unwrap(),
        "/tmp/optic-test.log"
    );
}

#[test]
fn interval_accepts_integer_seconds() {
    let _guard = selfmetric::test_lock();
    let config = Config::from_str(
        r#"
[sources.self]
kind = "internal"
interval = 15
forwards = ["out"]

[sinks.out]
kind = "discard"
"#,
    )
    .unwrap();

    assert_eq!(config.sources["self"].config.interval, Some(Duration::from_secs(15)));
}

#[test]
fn from_file_reads_disk() {
    let _guard = selfmetric::test_lock();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optic.conf");
    std::fs::write(
        &path,
        r#"
[sources.self]
kind = "internal"
forwards = ["out"]

[sinks.out]
kind = "discard"
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.sources.len(), 1);

    let err = Config::from_file(&dir.path().join("missing.conf")).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn load_agent_settings_reads_only_agent_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optic.conf");
    std::fs::write(
        &path,
        r#"
[agent]
thread_count = 2

[sources.broken]
# no kind; ignored by the settings-only loader
"#,
    )
    .unwrap();

    let agent = load_agent_settings(&path).unwrap();
    assert_eq!(agent.thread_count, Some(2));
}
