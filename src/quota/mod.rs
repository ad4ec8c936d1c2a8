//! Quota Module
//!
//! Calendar-day request quota persisted across restarts.

mod counter;
mod record;
mod storage;


pub use counter::{QuotaStatus, RequestQuota};
pub use record::QuotaRecord;
pub use storage::{FileRecordStore, MemoryRecordStore, RecordStore};
