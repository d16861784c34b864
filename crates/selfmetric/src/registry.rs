//! The global registry and its snapshot
//!
//! Groupings are keyed by `name + "," + sorted (tagKey+tagValue)` so that
//! tag-set equality maps to grouping equality regardless of insertion
//! order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use once_cell::sync::Lazy;

use optic_core::event::{Fields, Tags};
use optic_core::{Event, FieldValue, Metric, MetricType};

use crate::metrics::{Counter, Gauge, GaugeF64, Histogram};

/// Common namespace prefix for all internal metrics.
const INTERNAL_NAMESPACE: &str = "internal";

const NAME_SEPARATOR: char = ',';

#[derive(Debug, Clone)]
enum Handle {
    Counter(Counter),
    Gauge(Gauge),
    GaugeF64(GaugeF64),
    Histogram(Histogram),
}

impl Handle {
    fn kind(&self) -> &'static str {
        match self {
            Handle::Counter(_) => "Counter",
            Handle::Gauge(_) => "Gauge",
            Handle::GaugeF64(_) => "GaugeFloat64",
            Handle::Histogram(_) => "Histogram",
        }
    }
}

/// A group of metric fields sharing `(namespace, tags)`.
#[derive(Debug, Default)]
struct MultiMetric {
    name: String,
    tags: Tags,
    fields: HashMap<String, Handle>,
}

#[derive(Debug, Default)]
struct Registry {
    multis: BTreeMap<String, MultiMetric>,
}

static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::default()));

// Tests mutate the process-global registry; suites that assert on its
// contents serialize through this lock.
static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialize test access to the global registry.
pub fn test_lock() -> MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Return the existing counter or register a new one.
///
/// # Panics
///
/// Panics when `field` is already registered in this grouping under a
/// different kind.
pub fn get_or_register_counter(namespace: &str, field: &str, tags: Tags) -> Counter {
    with_field(namespace, field, tags, || Handle::Counter(Counter::new()), |h| match h {
        Handle::Counter(c) => c.clone(),
        other => panic!("Attempted to register Counter over {}", other.kind()),
    })
}

/// Return the existing gauge or register a new one.
///
/// # Panics
///
/// Panics on a kind conflict.
pub fn get_or_register_gauge(namespace: &str, field: &str, tags: Tags) -> Gauge {
    with_field(namespace, field, tags, || Handle::Gauge(Gauge::new()), |h| match h {
        Handle::Gauge(g) => g.clone(),
        other => panic!("Attempted to register Gauge over {}", other.kind()),
    })
}

/// Return the existing float gauge or register a new one.
///
/// # Panics
///
/// Panics on a kind conflict.
pub fn get_or_register_gauge_f64(namespace: &str, field: &str, tags: Tags) -> GaugeF64 {
    with_field(namespace, field, tags, || Handle::GaugeF64(GaugeF64::new()), |h| match h {
        Handle::GaugeF64(g) => g.clone(),
        other => panic!("Attempted to register GaugeFloat64 over {}", other.kind()),
    })
}

/// Return the existing histogram or register a new one.
///
/// # Panics
///
/// Panics on a kind conflict.
pub fn get_or_register_histogram(namespace: &str, field: &str, tags: Tags) -> Histogram {
    with_field(namespace, field, tags, || Handle::Histogram(Histogram::new()), |h| match h {
        Handle::Histogram(hist) => hist.clone(),
        other => panic!("Attempted to register Histogram over {}", other.kind()),
    })
}

fn with_field<T>(
    namespace: &str,
    field: &str,
    tags: Tags,
    make: impl FnOnce() -> Handle,
    extract: impl FnOnce(&Handle) -> T,
) -> T {
    let name = build_fq_name(INTERNAL_NAMESPACE, namespace);
    let key = grouping_key(&name, &tags);

    let mut registry = REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let multi = registry.multis.entry(key).or_insert_with(|| MultiMetric {
        name,
        tags,
        fields: HashMap::new(),
    });
    let handle = multi.fields.entry(field.to_string()).or_insert_with(make);
    extract(handle)
}

/// Snapshot every grouping as a metric event: one `internal_<namespace>`
/// metric per multi-metric, fields mapped to counter counts, gauge values,
/// and histogram means.
pub fn metrics() -> Vec<Event> {
    let registry = REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let now = Utc::now();

    let mut out = Vec::with_capacity(registry.multis.len());
    for multi in registry.multis.values() {
        if multi.fields.is_empty() {
            continue;
        }
        let mut fields = Fields::new();
        for (field_name, handle) in &multi.fields {
            let value = match handle {
                Handle::Counter(c) => FieldValue::Int(c.count()),
                Handle::Gauge(g) => FieldValue::Int(g.value()),
                Handle::GaugeF64(g) => FieldValue::Float(g.value()),
                Handle::Histogram(h) => FieldValue::Float(h.mean()),
            };
            fields.insert(field_name.clone(), value);
        }
        let metric = Metric::parsed(&multi.name, multi.tags.clone(), fields, now, MetricType::Untyped);
        out.push(Event::Metric(metric));
    }
    out
}

/// Clear the registry. Existing handles keep working but are no longer
/// reachable from `metrics()`; components re-register on construction.
pub fn reset() {
    let mut registry = REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.multis.clear();
}

/// Join two name components with `_`, ignoring empty components.
fn build_fq_name(namespace: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    if namespace.is_empty() {
        return name.to_string();
    }
    format!("{}_{}", namespace, name)
}

fn grouping_key(name: &str, tags: &Tags) -> String {
    let mut key = String::with_capacity(name.len() + 1);
    key.push_str(name);
    key.push(NAME_SEPARATOR);
    // BTreeMap iteration is already sorted by key
    for (k, v) in tags {
        key.push_str(k);
        key.push_str(v);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reregistering_returns_same_handle() {
        let _guard = test_lock();
        reset();

        let a = get_or_register_counter("agent", "events_processed", Tags::new());
        let b = get_or_register_counter("agent", "events_processed", Tags::new());
        a.inc(5);
        assert_eq!(b.count(), 5);
    }

    #[test]
    fn grouping_ignores_tag_insertion_order() {
        let _guard = test_lock();
        reset();

        let a = get_or_register_counter("gather", "calls", tags(&[("a", "1"), ("b", "2")]));
        let b = get_or_register_counter("gather", "calls", tags(&[("b", "2"), ("a", "1")]));
        a.inc(1);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn distinct_tags_distinct_groupings() {
        let _guard = test_lock();
        reset();

        let a = get_or_register_counter("sources", "events_processed", tags(&[("source", "x")]));
        let b = get_or_register_counter("sources", "events_processed", tags(&[("source", "y")]));
        a.inc(3);
        assert_eq!(b.count(), 0);
    }

    #[test]
    #[should_panic(expected = "Attempted to register Gauge over Counter")]
    fn kind_conflict_panics() {
        let _guard = test_lock();
        reset();

        let _ = get_or_register_counter("sink", "buffer_size", Tags::new());
        let _ = get_or_register_gauge("sink", "buffer_size", Tags::new());
    }

    #[test]
    fn snapshot_emits_multi_metrics() {
        let _guard = test_lock();
        reset();

        let counter = get_or_register_counter("agent", "events_processed", Tags::new());
        let gauge = get_or_register_gauge("agent", "queue_depth", Tags::new());
        let histogram =
            get_or_register_histogram("gather", "gather_time_nanoseconds", tags(&[("source", "s")]));

        counter.inc(12);
        gauge.update(4);
        histogram.update(100);
        histogram.update(200);

        let events = metrics();
        assert_eq!(events.len(), 2);

        let agent = events
            .iter()
            .filter_map(|e| e.as_metric())
            .find(|m| m.name() == "internal_agent")
            .expect("internal_agent metric");
        assert_eq!(agent.fields().get("events_processed"), Some(&FieldValue::Int(12)));
        assert_eq!(agent.fields().get("queue_depth"), Some(&FieldValue::Int(4)));

        let gather = events
            .iter()
            .filter_map(|e| e.as_metric())
            .find(|m| m.name() == "internal_gather")
            .expect("internal_gather metric");
        assert_eq!(gather.tags().get("source").unwrap(), "s");
        assert_eq!(
            gather.fields().get("gather_time_nanoseconds"),
            Some(&FieldValue::Float(150.0))
        );
    }

    #[test]
    fn reset_clears_groupings() {
        let _guard = test_lock();
        reset();

        let _ = get_or_register_counter("agent", "events_processed", Tags::new());
        assert_eq!(metrics().len(), 1);
        reset();
        assert!(metrics().is_empty());
    }

    #[test]
    fn fq_name_building() {
        assert_eq!(build_fq_name("internal", "agent"), "internal_agent");
        assert_eq!(build_fq_name("", "agent"), "agent");
        assert_eq!(build_fq_name("internal", ""), "");
    }
}
