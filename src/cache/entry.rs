//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Longest TTL honoured; larger requests are clamped to it (ten years)
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

// == Cache Entry ==
/// A stored (already shrunk) payload with the time it was written and its
/// lifetime. Entries are never patched; a write replaces the whole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Value,
    /// When the entry was written
    pub written_at: DateTime<Utc>,
    /// Lifetime of the entry
    pub ttl: Duration,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `written_at` - Write instant
    /// * `ttl_seconds` - Lifetime in seconds, clamped to [`MAX_TTL_SECS`]
    pub fn new(value: Value, written_at: DateTime<Utc>, ttl_seconds: u64) -> Self {
        let secs = ttl_seconds.min(MAX_TTL_SECS) as i64;
        Self {
            value,
            written_at,
            ttl: Duration::seconds(secs),
        }
    }

    // == Is Expired ==
    /// An entry is expired once strictly more than `ttl` has elapsed since it
    /// was written; at exactly `ttl` it is still live.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.written_at) > self.ttl
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(json!({"id": 1}), t0(), 60);

        assert_eq!(entry.value, json!({"id": 1}));
        assert_eq!(entry.written_at, t0());
        assert_eq!(entry.ttl, Duration::seconds(60));
        assert!(!entry.is_expired(t0()));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(json!("v"), t0(), 60);

        assert!(!entry.is_expired(t0() + Duration::seconds(60)));
        assert!(entry.is_expired(t0() + Duration::seconds(60) + Duration::milliseconds(1)));
    }

    #[test]
    fn test_zero_ttl_expires_after_any_time() {
        let entry = CacheEntry::new(json!("v"), t0(), 0);

        assert!(!entry.is_expired(t0()));
        assert!(entry.is_expired(t0() + Duration::milliseconds(1)));
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        let entry = CacheEntry::new(json!("v"), t0(), u64::MAX);
        assert_eq!(entry.ttl, Duration::seconds(MAX_TTL_SECS as i64));
        assert!(!entry.is_expired(t0() + Duration::days(365)));
    }
}
