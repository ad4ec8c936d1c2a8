//! Request Governor - client-side request governance for a hosted backend
//!
//! Serves reads from a bounded TTL cache, caps upstream traffic with a
//! persisted daily quota, and shrinks large payloads before caching them.

pub mod api;
pub mod cache;
pub mod clock;
pub mod compression;
pub mod config;
pub mod error;
pub mod governor;
pub mod models;
pub mod quota;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::CacheStore;
pub use compression::CompressionFilter;
pub use config::{Config, Policy};
pub use error::{GovernorError, Result};
pub use governor::{FallbackReason, Lookup, RequestGovernor};
pub use quota::RequestQuota;
pub use tasks::spawn_sync_task;
