//! Quota Record Module
//!
//! The single persisted record behind the daily request quota.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// == Quota Record ==
/// Requests issued on one calendar day.
///
/// Persisted as `{"date": "YYYY-MM-DD", "count": N}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub date: NaiveDate,
    pub count: u32,
}

impl QuotaRecord {
    /// Zero count for `date`.
    pub fn fresh(date: NaiveDate) -> Self {
        Self { date, count: 0 }
    }

    pub fn is_for(&self, day: NaiveDate) -> bool {
        self.date == day
    }

    /// Copy with the count raised by one. Saturates instead of wrapping.
    pub fn incremented(self) -> Self {
        Self {
            count: self.count.saturating_add(1),
            ..self
        }
    }
}
