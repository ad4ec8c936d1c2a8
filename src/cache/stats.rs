//! Cache Statistics Module
//!
//! Counters describing how the response cache is being used.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads answered with a live entry
    pub hits: u64,
    /// Reads that found nothing usable (absent or expired)
    pub misses: u64,
    /// Subset of `misses` where the entry was present but expired
    pub expired: u64,
    /// Entries dropped to make room for a new key
    pub evictions: u64,
    /// Values written, overwrites included
    pub writes: u64,
    /// Physical entry count, expired entries included
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts an expired read as a miss as well.
    pub fn record_expired(&mut self) {
        self.expired += 1;
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
