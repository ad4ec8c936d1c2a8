//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, data_handler, health_handler, invalidate_handler, quota_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /data/:resource` - Governed read of one page of a resource
/// - `DELETE /data/:resource` - Invalidate every cached page of a resource
/// - `DELETE /cache` - Clear the cache
/// - `GET /stats` - Cache statistics
/// - `GET /quota` - Today's request quota
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/data/:resource", get(data_handler).delete(invalidate_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/stats", get(stats_handler))
        .route("/quota", get(quota_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
