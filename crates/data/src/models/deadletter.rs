//! Deadletter entry model.
//!
//! One row per staged document that failed parsing or loading. Entries are
//! deleted on a successful retry; entries that exhaust the retry ceiling are
//! flagged abandoned and left for operator inspection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A failed document awaiting retry or operator action.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeadletterEntry {
    /// Document identity (symbol + retrieval timestamp)
    pub doc_id: String,
    /// Symbol the document was fetched for
    pub symbol: String,
    /// Failure reason from the most recent attempt
    pub reason: String,
    /// When the document first failed
    pub first_failed_at: DateTime<Utc>,
    /// When the document last failed
    pub last_failed_at: DateTime<Utc>,
    /// Retries attempted so far
    pub retry_count: i32,
    /// Not eligible for retry before this instant
    pub next_retry_at: DateTime<Utc>,
    /// Retry ceiling exceeded; excluded from automatic retries
    pub abandoned: bool,
}

impl DeadletterEntry {
    /// True once the entry has used up its automatic retries.
    #[must_use]
    pub fn is_exhausted(&self, retry_ceiling: i32) -> bool {
        self.retry_count >= retry_ceiling
    }

    /// True when the entry may be re-attempted at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.abandoned && now >= self.next_retry_at
    }
}

/// Computes the next eligibility instant after a failure at `failed_at`.
#[must_use]
pub fn next_retry_at(failed_at: DateTime<Utc>, retry_interval_hours: i64) -> DateTime<Utc> {
    failed_at + Duration::hours(retry_interval_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
    }

    fn entry(retry_count: i32, abandoned: bool) -> DeadletterEntry {
        let failed_at = sample_timestamp();
        DeadletterEntry {
            doc_id: "AAPL-20250801T120000Z".to_string(),
            symbol: "AAPL".to_string(),
            reason: "no price table found".to_string(),
            first_failed_at: failed_at,
            last_failed_at: failed_at,
            retry_count,
            next_retry_at: next_retry_at(failed_at, 24),
            abandoned,
        }
    }

    #[test]
    fn test_next_retry_at_adds_interval() {
        let failed_at = sample_timestamp();
        let eligible = next_retry_at(failed_at, 24);
        assert_eq!(eligible - failed_at, Duration::hours(24));
    }

    #[test]
    fn test_not_due_before_interval_elapses() {
        let e = entry(0, false);
        let just_before = e.next_retry_at - Duration::seconds(1);
        assert!(!e.is_due(just_before));
    }

    #[test]
    fn test_due_once_interval_elapses() {
        let e = entry(0, false);
        assert!(e.is_due(e.next_retry_at));
        assert!(e.is_due(e.next_retry_at + Duration::hours(1)));
    }

    #[test]
    fn test_abandoned_never_due() {
        let e = entry(5, true);
        assert!(!e.is_due(e.next_retry_at + Duration::days(365)));
    }

    #[test]
    fn test_exhaustion_at_ceiling() {
        assert!(!entry(4, false).is_exhausted(5));
        assert!(entry(5, false).is_exhausted(5));
        assert!(entry(6, false).is_exhausted(5));
    }
}
