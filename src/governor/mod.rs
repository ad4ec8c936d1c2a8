//! Request Governor
//!
//! Ties the cache, the quota and the upstream together. A read is served from
//! a fresh cache entry when possible; otherwise it goes upstream only if the
//! gateway is online and today's quota allows it, and falls back to whatever
//! the cache still physically holds when it cannot.

mod retry;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::config::Policy;
use crate::error::Result;
use crate::quota::{QuotaStatus, RequestQuota};
use crate::upstream::{resource_prefix, ResourceRequest, Upstream};

pub use retry::RetryPolicy;
use retry::with_retry;

// == Lookup ==
/// Why fresh data could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// `offline_mode` is on
    Offline,
    /// Today's request ceiling is reached
    QuotaExhausted,
    /// Every upstream attempt failed or timed out
    UpstreamFailed,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FallbackReason::Offline => "offline mode",
            FallbackReason::QuotaExhausted => "daily request quota exhausted",
            FallbackReason::UpstreamFailed => "upstream request failed",
        };
        f.write_str(text)
    }
}

/// Where a lookup's data came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Live cache entry; no request issued
    Hit(Value),
    /// Fetched from upstream just now (unshrunk; the cache holds the shrunk copy)
    Fetched(Value),
    /// Upstream not used or failed; an expired or unrefreshed cache value
    Stale { value: Value, reason: FallbackReason },
    /// Upstream not used or failed and nothing cached
    Miss(FallbackReason),
}

impl Lookup {
    pub fn reason(&self) -> Option<FallbackReason> {
        match self {
            Lookup::Stale { reason, .. } | Lookup::Miss(reason) => Some(*reason),
            Lookup::Hit(_) | Lookup::Fetched(_) => None,
        }
    }
}

// == Request Governor ==
/// Shared handle; cloning is cheap and every clone sees the same cache and
/// quota.
#[derive(Clone)]
pub struct RequestGovernor {
    policy: Arc<Policy>,
    cache: Arc<RwLock<CacheStore>>,
    quota: Arc<RequestQuota>,
    upstream: Arc<dyn Upstream>,
}

impl RequestGovernor {
    pub fn new(
        policy: Policy,
        cache: CacheStore,
        quota: RequestQuota,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            cache: Arc::new(RwLock::new(cache)),
            quota: Arc::new(quota),
            upstream,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn quota(&self) -> &RequestQuota {
        &self.quota
    }

    // == Fetch ==
    /// Cached read: a live entry short-circuits everything else.
    pub async fn fetch(&self, request: &ResourceRequest) -> Lookup {
        let key = request.fingerprint();

        if let Some(value) = self.cache.write().await.get(&key) {
            debug!("Cache hit for '{}'", key);
            return Lookup::Hit(value);
        }

        self.load(request, key).await
    }

    // == Refresh ==
    /// Like [`fetch`](Self::fetch) but always tries upstream first, subject to
    /// the same offline and quota gates.
    pub async fn refresh(&self, request: &ResourceRequest) -> Lookup {
        self.load(request, request.fingerprint()).await
    }

    /// Drops every cached page of `resource`. Returns how many entries went.
    pub async fn invalidate(&self, resource: &str) -> usize {
        let removed = self
            .cache
            .write()
            .await
            .remove_prefix(&resource_prefix(resource));
        debug!("Invalidated {} cached entries for '{}'", removed, resource);
        removed
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        info!("Cache cleared");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Entry-count bound of the cache actually in use.
    pub async fn cache_capacity(&self) -> usize {
        self.cache.read().await.capacity()
    }

    pub fn quota_status(&self) -> QuotaStatus {
        self.quota.status()
    }

    async fn load(&self, request: &ResourceRequest, key: String) -> Lookup {
        if self.policy.offline_mode {
            debug!("Offline mode, not fetching '{}'", key);
            return self.fall_back(&key, FallbackReason::Offline).await;
        }

        if !self.quota.can_make_request() {
            warn!(
                "Daily request quota of {} reached, not fetching '{}'",
                self.quota.limit(),
                key
            );
            return self.fall_back(&key, FallbackReason::QuotaExhausted).await;
        }

        match self.fetch_upstream(request).await {
            Ok(value) => {
                self.cache.write().await.set(key, value.clone(), None);
                Lookup::Fetched(value)
            }
            Err(e) => {
                warn!("Upstream fetch for '{}' failed: {}", key, e);
                self.fall_back(&key, FallbackReason::UpstreamFailed).await
            }
        }
    }

    /// Every attempt issued counts against the quota; retries stop early once
    /// the quota is spent.
    async fn fetch_upstream(&self, request: &ResourceRequest) -> Result<Value> {
        let quota = &self.quota;
        let upstream = &self.upstream;

        with_retry(
            move || {
                let count = quota.increment();
                debug!("Upstream request {} of {} today", count, quota.limit());
                upstream.fetch(request)
            },
            RetryPolicy::from_policy(&self.policy),
            || quota.can_make_request(),
        )
        .await
    }

    async fn fall_back(&self, key: &str, reason: FallbackReason) -> Lookup {
        match self.cache.read().await.get_stale(key) {
            Some(value) => Lookup::Stale { value, reason },
            None => Lookup::Miss(reason),
        }
    }
}
