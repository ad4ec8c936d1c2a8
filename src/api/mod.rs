//! API Module
//!
//! HTTP handlers and routing for the gateway REST API.
//!
//! # Endpoints
//! - `GET /data/:resource` - Governed read; query params become filters
//! - `DELETE /data/:resource` - Invalidate a resource's cached pages
//! - `DELETE /cache` - Clear the cache
//! - `GET /stats` - Get cache statistics
//! - `GET /quota` - Get today's request quota
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
