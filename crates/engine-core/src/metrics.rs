use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    partitions_processed: AtomicU64,
    units_decoded: AtomicU64,
    partial_sums: AtomicU64,
    keys_merged: AtomicU64,
    lines_written: AtomicU64,
}

/// Job-wide counters, shared by cloning.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub partitions_processed: u64,
    pub units_decoded: u64,
    pub partial_sums: u64,
    pub keys_merged: u64,
    pub lines_written: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_partitions(&self, count: u64) {
        self.inner
            .partitions_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_units(&self, count: u64) {
        self.inner.units_decoded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_partials(&self, count: u64) {
        self.inner.partial_sums.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_keys(&self, count: u64) {
        self.inner.keys_merged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_lines(&self, count: u64) {
        self.inner.lines_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            partitions_processed: self.inner.partitions_processed.load(Ordering::Relaxed),
            units_decoded: self.inner.units_decoded.load(Ordering::Relaxed),
            partial_sums: self.inner.partial_sums.load(Ordering::Relaxed),
            keys_merged: self.inner.keys_merged.load(Ordering::Relaxed),
            lines_written: self.inner.lines_written.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
