//! Tracked stock repository.
//!
//! The retrieval worklist. The trigger API (an external collaborator)
//! inserts rows here; the pipeline is the sole writer of the pull-status
//! fields. Rows are deactivated, never deleted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{PullStatus, TrackedStock};

/// Repository for the tracked-stock worklist.
#[derive(Debug, Clone)]
pub struct TrackedStockRepository {
    pool: PgPool,
}

impl TrackedStockRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a symbol onto the worklist, or reactivates it if it was
    /// previously untracked. Existing pull history is preserved.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn track(&self, symbol: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tracked_stocks (symbol, active, last_pull_status, created_at)
            VALUES ($1, TRUE, $2, NOW())
            ON CONFLICT (symbol) DO UPDATE
            SET active = TRUE
            "#,
        )
        .bind(symbol)
        .bind(PullStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to track symbol")?;

        Ok(())
    }

    /// Deactivates a symbol. The row and its audit trail remain.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn deactivate(&self, symbol: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tracked_stocks SET active = FALSE WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .execute(&self.pool)
        .await
        .context("Failed to deactivate symbol")?;

        Ok(())
    }

    /// Lists all symbols the scheduler should pull this cycle.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<TrackedStock>> {
        let stocks = sqlx::query_as::<_, TrackedStock>(
            r#"
            SELECT symbol, active, last_pull_at, last_pull_status, error_message, created_at
            FROM tracked_stocks
            WHERE active = TRUE
            ORDER BY symbol ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active symbols")?;

        Ok(stocks)
    }

    /// Fetches one tracked stock by symbol.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(&self, symbol: &str) -> Result<Option<TrackedStock>> {
        let stock = sqlx::query_as::<_, TrackedStock>(
            r#"
            SELECT symbol, active, last_pull_at, last_pull_status, error_message, created_at
            FROM tracked_stocks
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch tracked stock")?;

        Ok(stock)
    }

    /// Records a successful pull, clearing any previous error message.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn record_pull_success(&self, symbol: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tracked_stocks
            SET last_pull_at = $2,
                last_pull_status = $3,
                error_message = NULL
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .bind(at)
        .bind(PullStatus::Success.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to record pull success")?;

        Ok(())
    }

    /// Records a pull failure after retries were exhausted.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn record_pull_failure(
        &self,
        symbol: &str,
        at: DateTime<Utc>,
        error: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tracked_stocks
            SET last_pull_at = $2,
                last_pull_status = $3,
                error_message = $4
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .bind(at)
        .bind(PullStatus::Failed.as_str())
        .bind(error)
        .execute(&self.pool)
        .await
        .context("Failed to record pull failure")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_written_on_track() {
        // New rows start in the pending state.
        assert_eq!(PullStatus::Pending.as_str(), "pending");
    }

    #[test]
    fn test_success_and_failure_are_distinct_states() {
        assert_ne!(PullStatus::Success.as_str(), PullStatus::Failed.as_str());
    }
}
