//! Deadletter queue repository.
//!
//! Holds documents that failed parsing or loading, with a timed retry
//! policy. Inserts and updates are single statements, so concurrent
//! workers enqueueing the same document serialize on the primary key.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{next_retry_at, DeadletterEntry};

/// Repository for the deadletter queue.
#[derive(Debug, Clone)]
pub struct DeadletterRepository {
    pool: PgPool,
}

impl DeadletterRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueues a failed document, or refreshes an existing entry.
    ///
    /// Re-enqueueing keeps `first_failed_at` and `retry_count` so the
    /// abandonment ceiling is measured from the first failure, and pushes
    /// `next_retry_at` one interval past the new failure.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn enqueue(
        &self,
        doc_id: &str,
        symbol: &str,
        reason: &str,
        failed_at: DateTime<Utc>,
        retry_interval_hours: i64,
    ) -> Result<()> {
        let eligible = next_retry_at(failed_at, retry_interval_hours);

        sqlx::query(
            r#"
            INSERT INTO deadletter_queue
            (doc_id, symbol, reason, first_failed_at, last_failed_at,
             retry_count, next_retry_at, abandoned)
            VALUES ($1, $2, $3, $4, $4, 0, $5, FALSE)
            ON CONFLICT (doc_id) DO UPDATE
            SET reason = EXCLUDED.reason,
                last_failed_at = EXCLUDED.last_failed_at,
                next_retry_at = EXCLUDED.next_retry_at
            "#,
        )
        .bind(doc_id)
        .bind(symbol)
        .bind(reason)
        .bind(failed_at)
        .bind(eligible)
        .execute(&self.pool)
        .await
        .context("Failed to enqueue deadletter entry")?;

        Ok(())
    }

    /// Lists entries eligible for retry at `now`, oldest failure first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn due_for_retry(&self, now: DateTime<Utc>) -> Result<Vec<DeadletterEntry>> {
        let entries = sqlx::query_as::<_, DeadletterEntry>(
            r#"
            SELECT doc_id, symbol, reason, first_failed_at, last_failed_at,
                   retry_count, next_retry_at, abandoned
            FROM deadletter_queue
            WHERE abandoned = FALSE AND next_retry_at <= $1
            ORDER BY first_failed_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list due deadletter entries")?;

        Ok(entries)
    }

    /// Records a failed retry: bumps the retry count, refreshes the reason
    /// and eligibility window, and abandons the entry once the count
    /// reaches the ceiling.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn record_retry_failure(
        &self,
        doc_id: &str,
        reason: &str,
        failed_at: DateTime<Utc>,
        retry_interval_hours: i64,
        retry_ceiling: i32,
    ) -> Result<()> {
        let eligible = next_retry_at(failed_at, retry_interval_hours);

        sqlx::query(
            r#"
            UPDATE deadletter_queue
            SET retry_count = retry_count + 1,
                reason = $2,
                last_failed_at = $3,
                next_retry_at = $4,
                abandoned = (retry_count + 1 >= $5)
            WHERE doc_id = $1
            "#,
        )
        .bind(doc_id)
        .bind(reason)
        .bind(failed_at)
        .bind(eligible)
        .bind(retry_ceiling)
        .execute(&self.pool)
        .await
        .context("Failed to record retry failure")?;

        Ok(())
    }

    /// Removes an entry after a successful retry.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn resolve(&self, doc_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM deadletter_queue WHERE doc_id = $1
            "#,
        )
        .bind(doc_id)
        .execute(&self.pool)
        .await
        .context("Failed to resolve deadletter entry")?;

        Ok(())
    }

    /// Marks an entry permanently failed, excluding it from automatic
    /// retries until an operator intervenes.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn abandon(&self, doc_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE deadletter_queue SET abandoned = TRUE WHERE doc_id = $1
            "#,
        )
        .bind(doc_id)
        .execute(&self.pool)
        .await
        .context("Failed to abandon deadletter entry")?;

        Ok(())
    }

    /// Lists every entry, live and abandoned, for the operator surface.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_all(&self) -> Result<Vec<DeadletterEntry>> {
        let entries = sqlx::query_as::<_, DeadletterEntry>(
            r#"
            SELECT doc_id, symbol, reason, first_failed_at, last_failed_at,
                   retry_count, next_retry_at, abandoned
            FROM deadletter_queue
            ORDER BY first_failed_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list deadletter entries")?;

        Ok(entries)
    }
}
