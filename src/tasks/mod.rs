//! Background Tasks Module
//!
//! Contains background tasks that run periodically during gateway operation.
//!
//! # Tasks
//! - Sync: keeps configured resources warm in the cache

mod sync;

pub use sync::spawn_sync_task;
