//! Deadletter retry service.
//!
//! Wraps the deadletter repository with the timed-retry policy: entries
//! become eligible one interval after their last failure, re-enter the
//! processor state machine from the top, and are abandoned once the
//! retry ceiling is reached.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use stock_track_data::{DeadletterEntry, DeadletterRepository};
use stock_track_fetch::StagingArea;

use crate::processor::{DocumentOutcome, Processor};

/// Counts from one deadletter retry pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryReport {
    /// Entries that were due and attempted.
    pub attempted: usize,
    /// Entries that succeeded and were resolved.
    pub resolved: usize,
    /// Entries that failed again and were re-queued.
    pub requeued: usize,
    /// Entries that hit the ceiling (or lost their file) and were
    /// abandoned.
    pub abandoned: usize,
}

/// Timed-retry driver over the deadletter queue.
pub struct DeadletterService {
    repo: DeadletterRepository,
    staging: StagingArea,
    retry_interval_hours: i64,
    retry_ceiling: i32,
}

impl DeadletterService {
    /// Creates a new service.
    #[must_use]
    pub fn new(
        repo: DeadletterRepository,
        staging: StagingArea,
        retry_interval_hours: i64,
        retry_ceiling: i32,
    ) -> Self {
        Self {
            repo,
            staging,
            retry_interval_hours,
            retry_ceiling,
        }
    }

    /// Lists every queue entry for the operator surface.
    ///
    /// # Errors
    /// Returns an error if the queue cannot be read.
    pub async fn list(&self) -> Result<Vec<DeadletterEntry>> {
        self.repo.list_all().await
    }

    /// Re-attempts every entry that is due, feeding each document back
    /// through the processor from `Discovered`.
    ///
    /// Success resolves the entry and the document lands in `done/`.
    /// Failure re-queues it with an incremented retry count and a fresh
    /// eligibility window; at the ceiling the entry is abandoned and
    /// left for operator intervention. Entries whose staged file has
    /// gone missing are abandoned outright. One entry's failure never
    /// stops the pass.
    ///
    /// # Errors
    /// Returns an error only if the due list cannot be fetched.
    pub async fn retry_due(&self, processor: &Processor) -> Result<RetryReport> {
        let due = self
            .repo
            .due_for_retry(Utc::now())
            .await
            .context("Failed to list due deadletter entries")?;

        let mut report = RetryReport::default();

        for entry in due {
            report.attempted += 1;
            if let Err(e) = self.retry_entry(&entry, processor, &mut report).await {
                error!(doc_id = %entry.doc_id, error = %e, "deadletter retry pass failed for entry");
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                resolved = report.resolved,
                requeued = report.requeued,
                abandoned = report.abandoned,
                "deadletter retry pass finished"
            );
        }
        Ok(report)
    }

    async fn retry_entry(
        &self,
        entry: &DeadletterEntry,
        processor: &Processor,
        report: &mut RetryReport,
    ) -> Result<()> {
        let Some(doc) = self.staging.deadlettered(&entry.doc_id)? else {
            warn!(doc_id = %entry.doc_id, "deadlettered file missing, abandoning entry");
            self.repo.abandon(&entry.doc_id).await?;
            report.abandoned += 1;
            return Ok(());
        };

        match processor.process_document(&doc).await? {
            DocumentOutcome::Done { records_loaded, .. } => {
                self.repo.resolve(&entry.doc_id).await?;
                report.resolved += 1;
                info!(doc_id = %entry.doc_id, records = records_loaded, "deadletter retry succeeded");
            }
            DocumentOutcome::Deadlettered { reason, .. } => {
                self.repo
                    .record_retry_failure(
                        &entry.doc_id,
                        &reason,
                        Utc::now(),
                        self.retry_interval_hours,
                        self.retry_ceiling,
                    )
                    .await?;

                if entry.retry_count + 1 >= self.retry_ceiling {
                    report.abandoned += 1;
                    warn!(
                        doc_id = %entry.doc_id,
                        retries = entry.retry_count + 1,
                        "retry ceiling reached, entry abandoned"
                    );
                } else {
                    report.requeued += 1;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};
    use stock_track_data::next_retry_at;

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
    }

    fn entry(retry_count: i32) -> DeadletterEntry {
        let failed_at = sample_timestamp();
        DeadletterEntry {
            doc_id: "AAPL-20250801T120000Z".to_string(),
            symbol: "AAPL".to_string(),
            reason: "no price table found".to_string(),
            first_failed_at: failed_at,
            last_failed_at: failed_at,
            retry_count,
            next_retry_at: next_retry_at(failed_at, 24),
            abandoned: false,
        }
    }

    // ==================== Retry Policy Tests ====================

    #[test]
    fn test_entry_due_only_after_interval() {
        let e = entry(0);
        assert!(!e.is_due(sample_timestamp() + Duration::hours(23)));
        assert!(e.is_due(sample_timestamp() + Duration::hours(24)));
    }

    #[test]
    fn test_ceiling_decision_matches_service_arithmetic() {
        // The service abandons when retry_count + 1 reaches the ceiling.
        let ceiling = 5;
        assert!(entry(3).retry_count + 1 < ceiling); // requeued
        assert!(entry(4).retry_count + 1 >= ceiling); // abandoned
    }

    #[test]
    fn test_report_counts_are_independent() {
        let report = RetryReport {
            attempted: 3,
            resolved: 1,
            requeued: 1,
            abandoned: 1,
        };
        assert_eq!(report.resolved + report.requeued + report.abandoned, report.attempted);
    }
}
