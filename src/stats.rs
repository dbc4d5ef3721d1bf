//! Statistics tracking for the open tiers and cache promotions

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache effectiveness
///
/// Cheap to clone; clones share the same underlying counters, so handles can
/// carry one into their close path.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Opens served from the in-memory content cache
    mem_hits: Arc<AtomicU64>,
    /// Opens served by reusing an idle pooled handle
    handle_reuses: Arc<AtomicU64>,
    /// Opens that fell through to a real open
    misses: Arc<AtomicU64>,
    /// Successful capture-on-close promotions into the memory cache
    promotions: Arc<AtomicU64>,
    /// Captures declined because of a size mismatch or failed re-stat
    declined_captures: Arc<AtomicU64>,
    /// Bytes served from memory instead of disk
    bytes_from_memory: Arc<AtomicU64>,
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            mem_hits: Arc::new(AtomicU64::new(0)),
            handle_reuses: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            promotions: Arc::new(AtomicU64::new(0)),
            declined_captures: Arc::new(AtomicU64::new(0)),
            bytes_from_memory: Arc::new(AtomicU64::new(0)),
        }
    }

    pub(crate) fn record_mem_hit(&self, bytes: u64) {
        self.mem_hits.fetch_add(1, Ordering::Relaxed);
        self.bytes_from_memory.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_handle_reuse(&self) {
        self.handle_reuses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_declined_capture(&self) {
        self.declined_captures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters at a point in time.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            mem_hits: self.mem_hits.load(Ordering::Relaxed),
            handle_reuses: self.handle_reuses.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            declined_captures: self.declined_captures.load(Ordering::Relaxed),
            bytes_from_memory: self.bytes_from_memory.load(Ordering::Relaxed),
        }
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of [`CacheStats`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Opens served from the in-memory content cache
    pub mem_hits: u64,
    /// Opens served by reusing an idle pooled handle
    pub handle_reuses: u64,
    /// Opens that fell through to a real open
    pub misses: u64,
    /// Successful promotions into the memory cache
    pub promotions: u64,
    /// Captures declined at close time
    pub declined_captures: u64,
    /// Bytes served from memory instead of disk
    pub bytes_from_memory: u64,
}

impl StatsSnapshot {
    /// Fraction of opens that avoided a real open (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.mem_hits + self.handle_reuses;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
