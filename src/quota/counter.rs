//! Daily Request Quota
//!
//! Counts upstream requests per calendar day against a ceiling, persisting
//! the count through a [`RecordStore`] so it survives restarts.

use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::SharedClock;
use crate::config::Policy;
use crate::quota::{QuotaRecord, RecordStore};

// == Quota Status ==
/// Snapshot of today's quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub date: NaiveDate,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub can_make_request: bool,
}

// == Request Quota ==
/// Calendar-day request counter.
///
/// Every operation runs its whole load/rollover/save sequence under one
/// mutex, so concurrent increments are never lost within a process.
/// Persistence faults are logged and masked: an unreadable record counts as
/// no record, a failed save leaves the caller unaffected.
#[derive(Debug)]
pub struct RequestQuota {
    store: Mutex<Box<dyn RecordStore>>,
    clock: SharedClock,
    max_daily_requests: u32,
}

impl RequestQuota {
    pub fn new(store: Box<dyn RecordStore>, max_daily_requests: u32, clock: SharedClock) -> Self {
        Self {
            store: Mutex::new(store),
            clock,
            max_daily_requests,
        }
    }

    pub fn from_policy(policy: &Policy, store: Box<dyn RecordStore>, clock: SharedClock) -> Self {
        Self::new(store, policy.max_daily_requests, clock)
    }

    // == Today ==
    /// Requests counted so far today. A record from another day is reset to
    /// zero and written back.
    pub fn today(&self) -> u32 {
        let store = self.lock();
        self.current(&**store).count
    }

    // == Increment ==
    /// Counts one more request today and returns the new count.
    ///
    /// The counter is not clamped at the ceiling; only
    /// [`can_make_request`](Self::can_make_request) changes.
    pub fn increment(&self) -> u32 {
        let store = self.lock();
        let record = self.current(&**store).incremented();
        persist(&**store, &record);
        record.count
    }

    // == Can Make Request ==
    /// True while today's count is below the ceiling. Consumes nothing.
    pub fn can_make_request(&self) -> bool {
        self.today() < self.max_daily_requests
    }

    pub fn status(&self) -> QuotaStatus {
        let store = self.lock();
        let record = self.current(&**store);
        QuotaStatus {
            date: record.date,
            count: record.count,
            limit: self.max_daily_requests,
            remaining: self.max_daily_requests.saturating_sub(record.count),
            can_make_request: record.count < self.max_daily_requests,
        }
    }

    pub fn limit(&self) -> u32 {
        self.max_daily_requests
    }

    /// Today's record, replacing (and persisting) a missing, unreadable or
    /// out-of-date one with a fresh zero count.
    fn current(&self, store: &dyn RecordStore) -> QuotaRecord {
        let today = self.clock.today();

        let stored = match store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Quota record unreadable, counting from zero: {}", e);
                None
            }
        };

        match stored {
            Some(record) if record.is_for(today) => record,
            Some(stale) => {
                debug!(
                    "Quota rolled over from {} ({} requests) to {}",
                    stale.date, stale.count, today
                );
                let fresh = QuotaRecord::fresh(today);
                persist(store, &fresh);
                fresh
            }
            None => {
                let fresh = QuotaRecord::fresh(today);
                persist(store, &fresh);
                fresh
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn RecordStore>> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn persist(store: &dyn RecordStore, record: &QuotaRecord) {
    if let Err(e) = store.save(record) {
        warn!("Failed to persist quota record for {}: {}", record.date, e);
    }
}
