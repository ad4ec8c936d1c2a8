//! Cache Store Module
//!
//! Bounded response cache: HashMap storage, FIFO eviction by insertion order,
//! lazy TTL expiry and payload shrinking on write.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};
use crate::clock::SharedClock;
use crate::compression::CompressionFilter;
use crate::config::Policy;

// == Cache Store ==
/// In-memory response cache.
///
/// Expired entries stay in place until they are evicted, overwritten,
/// removed or cleared; they only read as absent. Callers sharing a store
/// across tasks wrap it in a lock so evict-then-insert stays atomic.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// FIFO eviction order
    order: InsertionOrder,
    /// Usage counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL in seconds for writes that do not give one
    default_ttl: u64,
    /// Applied to every value before it is stored
    filter: CompressionFilter,
    clock: SharedClock,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl` - TTL in seconds for writes without an explicit TTL
    /// * `filter` - Shrinks values on write
    /// * `clock` - Time source for write stamps and expiry checks
    pub fn new(
        max_entries: usize,
        default_ttl: u64,
        filter: CompressionFilter,
        clock: SharedClock,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
            filter,
            clock,
        }
    }

    /// Creates a store sized and tuned by the policy.
    pub fn from_policy(policy: &Policy, clock: SharedClock) -> Self {
        Self::new(
            policy.max_cache_size,
            policy.cache_ttl,
            CompressionFilter::from_policy(policy),
            clock,
        )
    }

    // == Set ==
    /// Stores a value under `key`, shrinking it first.
    ///
    /// Overwriting an existing key replaces its entry and restamps it but
    /// keeps its original place in the eviction order. Inserting a new key
    /// into a full store first evicts the earliest inserted entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The payload to store
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None)
    pub fn set(&mut self, key: String, value: Value, ttl: Option<u64>) {
        if self.max_entries == 0 {
            debug!("Cache disabled (capacity 0), dropping write for '{}'", key);
            return;
        }

        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.order.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
                debug!("Evicted '{}' to make room for '{}'", evicted_key, key);
            }
        }

        let value = self.filter.shrink(value);
        let entry = CacheEntry::new(
            value,
            self.clock.now(),
            ttl.unwrap_or(self.default_ttl),
        );

        if !is_overwrite {
            self.order.push(&key);
        }
        self.entries.insert(key, entry);

        self.stats.record_write();
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the stored payload if present and not expired.
    ///
    /// An expired entry reads as absent but is left in place.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.stats.record_expired();
                None
            }
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Get Stale ==
    /// Returns whatever is physically stored under `key`, expired or not.
    ///
    /// Used for fallback when fresh data cannot be fetched; not counted in
    /// the statistics.
    pub fn get_stale(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Remove ==
    /// Drops one entry. Returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        existed
    }

    /// Drops every entry whose key starts with `prefix`. Returns how many.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &doomed {
            self.entries.remove(key);
            self.order.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        doomed.len()
    }

    // == Clear ==
    /// Drops all entries immediately.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Physical number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
