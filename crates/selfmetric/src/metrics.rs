//! Metric handle kinds
//!
//! All handles are `Arc`-backed and cloneable; updates use relaxed atomics.
//! Values may be slightly stale when read — these metrics are eventually
//! consistent, not real-time.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonically increasing counter.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicI64>);

impl Counter {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicI64::new(0)))
    }

    /// Increment by `n`.
    #[inline]
    pub fn inc(&self, n: i64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    /// Current count.
    #[inline]
    pub fn count(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Point-in-time integer value.
#[derive(Debug, Clone, Default)]
pub struct Gauge(Arc<AtomicI64>);

impl Gauge {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicI64::new(0)))
    }

    /// Replace the value.
    #[inline]
    pub fn update(&self, v: i64) {
        self.0.store(v, Ordering::Relaxed);
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Point-in-time float value, stored as bits in an atomic.
#[derive(Debug, Clone, Default)]
pub struct GaugeF64(Arc<AtomicU64>);

impl GaugeF64 {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0f64.to_bits())))
    }

    /// Replace the value.
    #[inline]
    pub fn update(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
pub(crate) struct HistogramInner {
    count: AtomicU64,
    sum: AtomicI64,
}

/// Sampled distribution. The registry snapshot emits the mean, so the
/// histogram tracks count and sum.
#[derive(Debug, Clone, Default)]
pub struct Histogram(Arc<HistogramInner>);

impl Histogram {
    pub(crate) fn new() -> Self {
        Self(Arc::new(HistogramInner::default()))
    }

    /// Record an observation.
    #[inline]
    pub fn update(&self, v: i64) {
        self.0.count.fetch_add(1, Ordering::Relaxed);
        self.0.sum.fetch_add(v, Ordering::Relaxed);
    }

    /// Number of observations.
    #[inline]
    pub fn count(&self) -> u64 {
        self.0.count.load(Ordering::Relaxed)
    }

    /// Mean of all observations, 0 when empty.
    pub fn mean(&self) -> f64 {
        let count = self.0.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.0.sum.load(Ordering::Relaxed) as f64 / count as f64
    }
}
