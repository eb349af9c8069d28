//! Cache Statistics Module
//!
//! Tracks hits, misses and reaper activity with lock-free counters so that
//! reads never need the store's write lock to record themselves.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Live counters owned by a cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    cleanup_runs: AtomicU64,
    reaped: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Cleanup ==
    /// Counts one cleanup pass and the entries it removed.
    pub fn record_cleanup(&self, removed: usize) {
        self.cleanup_runs.fetch_add(1, Ordering::Relaxed);
        self.reaped.fetch_add(removed as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a serializable snapshot.
    pub fn snapshot(&self, total_entries: usize, enabled: bool) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cleanup_runs: self.cleanup_runs.load(Ordering::Relaxed),
            reaped: self.reaped.load(Ordering::Relaxed),
            total_entries,
            enabled,
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time view of a cache's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Number of `get` calls that returned a value
    pub hits: u64,
    /// Number of `get` calls that found nothing, a stale entry, or a disabled cache
    pub misses: u64,
    /// Number of completed cleanup passes
    pub cleanup_runs: u64,
    /// Total stale entries physically removed by cleanup passes
    pub reaped: u64,
    /// Physical entry count, live and stale
    pub total_entries: usize,
    /// Enablement gate state
    pub enabled: bool,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let snap = CacheStats::new().snapshot(0, true);
        assert_eq!(snap.hits, 0);
        assert_eq!(snap.misses, 0);
        assert_eq!(snap.cleanup_runs, 0);
        assert_eq!(snap.reaped, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let snap = CacheStats::new().snapshot(0, true);
        assert_eq!(snap.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.snapshot(0, true).hit_rate(), 0.75);
    }

    #[test]
    fn test_record_cleanup_accumulates() {
        let stats = CacheStats::new();
        stats.record_cleanup(3);
        stats.record_cleanup(0);

        let snap = stats.snapshot(7, false);
        assert_eq!(snap.cleanup_runs, 2);
        assert_eq!(snap.reaped, 3);
        assert_eq!(snap.total_entries, 7);
        assert!(!snap.enabled);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = CacheStats::new();
        stats.record_miss();

        let json = serde_json::to_value(stats.snapshot(2, true)).unwrap();
        assert_eq!(json["misses"], 1);
        assert_eq!(json["total_entries"], 2);
        assert_eq!(json["enabled"], true);
    }
}
