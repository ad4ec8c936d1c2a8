//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::governor::{FallbackReason, Lookup};
use crate::quota::QuotaStatus;

/// Where the data in a [`DataResponse`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Cache,
    Network,
    Stale,
}

/// Response body for `GET /data/:resource`
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse {
    pub resource: String,
    pub source: DataSource,
    pub data: Value,
    /// Why fresh data was not fetched; present only for stale data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FallbackReason>,
}

impl DataResponse {
    /// Builds the body for a lookup that produced data; `None` for a miss.
    pub fn from_lookup(resource: impl Into<String>, lookup: Lookup) -> Option<Self> {
        let (source, data, reason) = match lookup {
            Lookup::Hit(data) => (DataSource::Cache, data, None),
            Lookup::Fetched(data) => (DataSource::Network, data, None),
            Lookup::Stale { value, reason } => (DataSource::Stale, value, Some(reason)),
            Lookup::Miss(_) => return None,
        };

        Some(Self {
            resource: resource.into(),
            source,
            data,
            reason,
        })
    }
}

/// Response body for `DELETE /data/:resource`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub resource: String,
    /// Cached pages dropped
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(resource: impl Into<String>, removed: usize) -> Self {
        let resource = resource.into();
        Self {
            message: format!("Invalidated {} cached entries for '{}'", removed, resource),
            resource,
            removed,
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    /// Misses caused by expired entries
    pub expired: u64,
    pub evictions: u64,
    pub writes: u64,
    /// Current number of entries in cache, expired ones included
    pub total_entries: usize,
    /// Entry-count bound
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, capacity: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            evictions: stats.evictions,
            writes: stats.writes,
            total_entries: stats.total_entries,
            capacity,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the quota endpoint (GET /quota)
#[derive(Debug, Clone, Serialize)]
pub struct QuotaResponse {
    #[serde(flatten)]
    pub status: QuotaStatus,
    pub offline_mode: bool,
}

impl QuotaResponse {
    pub fn new(status: QuotaStatus, offline_mode: bool) -> Self {
        Self {
            status,
            offline_mode,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub offline_mode: bool,
}

impl HealthResponse {
    pub fn healthy(offline_mode: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            offline_mode,
        }
    }
}
