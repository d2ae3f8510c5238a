//! Atomic pool statistics for lock-free usage tracking.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::key::PoolKey;

/// Statistics for pool usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Checkouts served from the available list.
    pub hits: u64,
    /// Checkouts served by constructing a new instance.
    pub misses: u64,
    /// Checkouts that had to wait on the soft limit.
    pub waits: u64,
    /// Checkouts that failed on the hard limit.
    pub exhausted: u64,
    /// Checkouts abandoned because their token was cancelled.
    pub cancelled: u64,
    /// Instances returned to the available list.
    pub releases: u64,
    /// Instances discarded as dirty.
    pub discards: u64,
    /// Idle instances evicted by cleanup.
    pub evictions: u64,
    /// Factory calls that returned an error.
    pub construction_failures: u64,
}

impl PoolStats {
    /// Total checkouts that handed out an instance.
    #[must_use]
    pub fn served(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of served checkouts that reused an instance.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let served = self.served();
        if served == 0 {
            0.0
        } else {
            self.hits as f64 / served as f64
        }
    }

    /// Sum two snapshots field by field.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            waits: self.waits + other.waits,
            exhausted: self.exhausted + other.exhausted,
            cancelled: self.cancelled + other.cancelled,
            releases: self.releases + other.releases,
            discards: self.discards + other.discards,
            evictions: self.evictions + other.evictions,
            construction_failures: self.construction_failures + other.construction_failures,
        }
    }
}

/// Point-in-time view of one pool, read under its lock.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    /// Key of the pool.
    pub key: PoolKey,
    /// Instances currently checked out.
    pub in_use: usize,
    /// Instances ready for reuse.
    pub available: usize,
    /// Counters since creation or last reset.
    pub stats: PoolStats,
}

impl PoolSnapshot {
    /// Instances the pool currently tracks.
    #[must_use]
    pub fn total(&self) -> usize {
        self.in_use + self.available
    }
}

/// Atomic pool statistics for lock-free updates.
#[derive(Default)]
pub struct AtomicPoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    waits: AtomicU64,
    exhausted: AtomicU64,
    cancelled: AtomicU64,
    releases: AtomicU64,
    discards: AtomicU64,
    evictions: AtomicU64,
    construction_failures: AtomicU64,
}

impl AtomicPoolStats {
    /// Create new zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            construction_failures: self.construction_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in self.counters() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn counters(&self) -> [&AtomicU64; 9] {
        [
            &self.hits,
            &self.misses,
            &self.waits,
            &self.exhausted,
            &self.cancelled,
            &self.releases,
            &self.discards,
            &self.evictions,
            &self.construction_failures,
        ]
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discard(&self) {
        self.discards.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_construction_failure(&self) {
        self.construction_failures.fetch_add(1, Ordering::Relaxed);
    }
}
