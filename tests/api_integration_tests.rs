//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against a scripted
//! backend.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use request_governor::{
    api::create_router,
    cache::CacheStore,
    clock::{ManualClock, SharedClock},
    config::Policy,
    error::{GovernorError, Result},
    governor::RequestGovernor,
    quota::{FileRecordStore, MemoryRecordStore, RecordStore, RequestQuota},
    upstream::{ResourceRequest, Upstream},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

/// Backend that echoes the request and can be taken down.
#[derive(Default)]
struct StubBackend {
    down: AtomicBool,
    calls: AtomicU32,
}

impl StubBackend {
    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl Upstream for StubBackend {
    async fn fetch(&self, request: &ResourceRequest) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(GovernorError::Upstream("backend down".to_string()));
        }
        Ok(json!({
            "resource": request.resource,
            "filters": request.filters,
            "limit": request.page_size,
            "offset": request.offset(),
        }))
    }
}

struct TestApp {
    router: Router,
    backend: Arc<StubBackend>,
    clock: Arc<ManualClock>,
}

fn test_policy() -> Policy {
    Policy {
        max_retries: 2,
        retry_delay: 0,
        request_timeout: 1000,
        ..Policy::default()
    }
}

fn create_test_app_with(policy: Policy, store: Box<dyn RecordStore>) -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    ));
    let shared: SharedClock = clock.clone();
    let backend = Arc::new(StubBackend::default());

    let cache = CacheStore::from_policy(&policy, shared.clone());
    let quota = RequestQuota::from_policy(&policy, store, shared);
    let governor = RequestGovernor::new(policy, cache, quota, backend.clone());

    TestApp {
        router: create_router(AppState::new(governor)),
        backend,
        clock,
    }
}

fn create_test_app(policy: Policy) -> TestApp {
    create_test_app_with(policy, Box::new(MemoryRecordStore::new()))
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// == Data Endpoint Tests ==

#[tokio::test]
async fn test_data_fetches_then_serves_from_cache() {
    let app = create_test_app(test_policy());

    let (status, json) = send(&app.router, "GET", "/data/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "network");
    assert_eq!(json["resource"], "products");
    assert!(json.get("reason").is_none());

    let (status, json) = send(&app.router, "GET", "/data/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "cache");
    assert_eq!(app.backend.calls(), 1);
}

#[tokio::test]
async fn test_data_filters_and_paging_reach_backend() {
    let app = create_test_app(test_policy());

    let (status, json) = send(
        &app.router,
        "GET",
        "/data/products?category=eq.cakes&page=2&page_size=10",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["filters"]["category"], "eq.cakes");
    assert_eq!(json["data"]["limit"], 10);
    assert_eq!(json["data"]["offset"], 20);
}

#[tokio::test]
async fn test_data_pages_are_cached_separately() {
    let app = create_test_app(test_policy());

    send(&app.router, "GET", "/data/products?page=0").await;
    let (_, json) = send(&app.router, "GET", "/data/products?page=1").await;

    assert_eq!(json["source"], "network");
    assert_eq!(app.backend.calls(), 2);
}

#[tokio::test]
async fn test_data_page_size_clamped() {
    let app = create_test_app(test_policy());

    let (_, json) = send(&app.router, "GET", "/data/products?page_size=5000").await;
    assert_eq!(json["data"]["limit"], Policy::default().max_page_size);
}

#[tokio::test]
async fn test_data_bad_page_is_bad_request() {
    let app = create_test_app(test_policy());

    let (status, json) = send(&app.router, "GET", "/data/products?page=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("page"));
    assert_eq!(app.backend.calls(), 0);
}

#[tokio::test]
async fn test_data_reserved_filter_is_bad_request() {
    let app = create_test_app(test_policy());

    let (status, _) = send(&app.router, "GET", "/data/products?offset=40").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_data_stale_after_expiry_when_backend_down() {
    let app = create_test_app(test_policy());
    send(&app.router, "GET", "/data/sales").await;

    app.clock
        .advance(Duration::seconds(test_policy().cache_ttl as i64 + 1));
    app.backend.set_down(true);

    let (status, json) = send(&app.router, "GET", "/data/sales").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "stale");
    assert_eq!(json["reason"], "upstream_failed");
    assert_eq!(json["data"]["resource"], "sales");
}

#[tokio::test]
async fn test_data_backend_down_without_cache_is_unavailable() {
    let app = create_test_app(test_policy());
    app.backend.set_down(true);

    let (status, json) = send(&app.router, "GET", "/data/sales").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json.get("error").is_some());
    assert_eq!(app.backend.calls(), test_policy().max_retries);
}

#[tokio::test]
async fn test_offline_mode_never_calls_backend() {
    let app = create_test_app(Policy {
        offline_mode: true,
        ..test_policy()
    });

    let (status, _) = send(&app.router, "GET", "/data/products").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.backend.calls(), 0);

    let (_, quota) = send(&app.router, "GET", "/quota").await;
    assert_eq!(quota["count"], 0);
    assert_eq!(quota["offline_mode"], true);
}

// == Quota Endpoint Tests ==

#[tokio::test]
async fn test_quota_exhaustion_blocks_backend() {
    let app = create_test_app(Policy {
        max_daily_requests: 2,
        ..test_policy()
    });

    send(&app.router, "GET", "/data/products").await;
    send(&app.router, "GET", "/data/sales").await;

    let (status, _) = send(&app.router, "GET", "/data/stock").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.backend.calls(), 2);

    // Cached data is still served.
    let (status, json) = send(&app.router, "GET", "/data/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "cache");

    let (_, quota) = send(&app.router, "GET", "/quota").await;
    assert_eq!(quota["count"], 2);
    assert_eq!(quota["remaining"], 0);
    assert_eq!(quota["can_make_request"], false);
}

#[tokio::test]
async fn test_quota_resets_on_new_day() {
    let app = create_test_app(Policy {
        max_daily_requests: 1,
        ..test_policy()
    });

    send(&app.router, "GET", "/data/products").await;
    let (_, quota) = send(&app.router, "GET", "/quota").await;
    assert_eq!(quota["can_make_request"], false);

    app.clock.advance(Duration::days(1));

    let (_, quota) = send(&app.router, "GET", "/quota").await;
    assert_eq!(quota["date"], "2024-05-02");
    assert_eq!(quota["count"], 0);
    assert_eq!(quota["can_make_request"], true);
}

#[tokio::test]
async fn test_quota_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quota.json");

    let first = create_test_app_with(test_policy(), Box::new(FileRecordStore::new(&path)));
    send(&first.router, "GET", "/data/products").await;
    send(&first.router, "GET", "/data/sales").await;

    let second = create_test_app_with(test_policy(), Box::new(FileRecordStore::new(&path)));
    let (_, quota) = send(&second.router, "GET", "/quota").await;
    assert_eq!(quota["count"], 2);
}

// == Invalidate / Clear Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_drops_every_page() {
    let app = create_test_app(test_policy());
    send(&app.router, "GET", "/data/products?page=0").await;
    send(&app.router, "GET", "/data/products?page=1").await;
    send(&app.router, "GET", "/data/sales").await;

    let (status, json) = send(&app.router, "DELETE", "/data/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 2);

    let (_, json) = send(&app.router, "GET", "/data/sales").await;
    assert_eq!(json["source"], "cache");
    let (_, json) = send(&app.router, "GET", "/data/products?page=0").await;
    assert_eq!(json["source"], "network");
}

#[tokio::test]
async fn test_invalidate_bad_resource_name() {
    let app = create_test_app(test_policy());

    let (status, _) = send(&app.router, "DELETE", "/data/bad-name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_cache() {
    let app = create_test_app(test_policy());
    send(&app.router, "GET", "/data/products").await;

    let (status, json) = send(&app.router, "DELETE", "/cache").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("cleared"));

    let (_, stats) = send(&app.router, "GET", "/stats").await;
    assert_eq!(stats["total_entries"], 0);
}

// == Stats / Health Endpoint Tests ==

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let app = create_test_app(test_policy());
    send(&app.router, "GET", "/data/products").await;
    send(&app.router, "GET", "/data/products").await;

    let (status, stats) = send(&app.router, "GET", "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["capacity"], test_policy().max_cache_size);
}

#[tokio::test]
async fn test_stats_count_evictions() {
    let app = create_test_app(Policy {
        max_cache_size: 2,
        ..test_policy()
    });
    send(&app.router, "GET", "/data/a").await;
    send(&app.router, "GET", "/data/b").await;
    send(&app.router, "GET", "/data/c").await;

    let (_, stats) = send(&app.router, "GET", "/stats").await;
    assert_eq!(stats["evictions"], 1);
    assert_eq!(stats["total_entries"], 2);

    // Oldest entry went first.
    let (_, json) = send(&app.router, "GET", "/data/a").await;
    assert_eq!(json["source"], "network");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(test_policy());

    let (status, json) = send(&app.router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
