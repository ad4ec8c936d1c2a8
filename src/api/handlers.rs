//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::CacheStore;
use crate::clock::system_clock;
use crate::config::Config;
use crate::error::{GovernorError, Result};
use crate::governor::RequestGovernor;
use crate::models::{
    ClearResponse, DataQuery, DataResponse, HealthResponse, InvalidateResponse, QuotaResponse,
    StatsResponse,
};
use crate::quota::{FileRecordStore, RequestQuota};
use crate::upstream::{HttpUpstream, ResourceRequest};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub governor: RequestGovernor,
}

impl AppState {
    pub fn new(governor: RequestGovernor) -> Self {
        Self { governor }
    }

    /// Wires the production stack: wall clock, file-backed quota record and
    /// the HTTP backend.
    pub fn from_config(config: &Config) -> Self {
        let clock = system_clock();
        let cache = CacheStore::from_policy(&config.policy, clock.clone());
        let quota = RequestQuota::from_policy(
            &config.policy,
            Box::new(FileRecordStore::new(config.quota_file.clone())),
            clock,
        );
        let upstream = Arc::new(HttpUpstream::from_config(config));

        Self::new(RequestGovernor::new(
            config.policy.clone(),
            cache,
            quota,
            upstream,
        ))
    }
}

/// Handler for GET /data/:resource
///
/// Governed read of one page of a resource.
pub async fn data_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DataResponse>> {
    let request = DataQuery::new(params)
        .into_request(&resource, state.governor.policy())
        .map_err(GovernorError::InvalidRequest)?;

    let lookup = state.governor.fetch(&request).await;
    let reason = lookup.reason();

    DataResponse::from_lookup(resource.clone(), lookup)
        .map(Json)
        .ok_or_else(|| {
            let reason = reason.map(|r| r.to_string()).unwrap_or_default();
            GovernorError::Unavailable(format!("No data for '{}': {}", resource, reason))
        })
}

/// Handler for DELETE /data/:resource
///
/// Drops every cached page of the resource.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let request = ResourceRequest::new(resource.as_str(), state.governor.policy());
    if let Some(error_msg) = request.validate() {
        return Err(GovernorError::InvalidRequest(error_msg));
    }

    let removed = state.governor.invalidate(&resource).await;
    Ok(Json(InvalidateResponse::new(resource, removed)))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.governor.clear_cache().await;
    Json(ClearResponse::cleared())
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.governor.cache_stats().await;
    let capacity = state.governor.cache_capacity().await;
    Json(StatsResponse::new(&stats, capacity))
}

/// Handler for GET /quota
pub async fn quota_handler(State(state): State<AppState>) -> Json<QuotaResponse> {
    Json(QuotaResponse::new(
        state.governor.quota_status(),
        state.governor.policy().offline_mode,
    ))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.governor.policy().offline_mode))
}
