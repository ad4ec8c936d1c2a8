//! Cache Module
//!
//! In-memory response cache with lazy TTL expiry and FIFO eviction.

mod entry;
mod fifo;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, MAX_TTL_SECS};
pub use fifo::InsertionOrder;
pub use stats::CacheStats;
pub use store::CacheStore;
