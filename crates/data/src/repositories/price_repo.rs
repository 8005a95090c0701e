//! Price history repository.
//!
//! Provides idempotent batch upserts and per-symbol queries against the
//! `price_history` table. The unique index on (symbol, date) makes
//! re-ingestion of overlapping date ranges safe: new dates insert,
//! existing dates overwrite with the latest values.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::PriceRecord;

/// Repository for daily price rows.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts a batch of price records inside a single transaction.
    ///
    /// Uses ON CONFLICT (symbol, date) DO UPDATE so that loading the same
    /// records twice leaves storage identical to loading them once. Rows
    /// are never deleted here; the write path is additive/overwriting only.
    /// The transaction either commits the whole batch or rolls it back.
    ///
    /// # Returns
    /// The number of rows written (inserted or overwritten).
    ///
    /// # Errors
    /// Returns an error if the database transaction fails; the caller is
    /// expected to treat this as a per-batch failure, not a fatal one.
    pub async fn upsert_batch(&self, records: &[PriceRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let mut written = 0u64;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO price_history (symbol, date, open, high, low, close, adj_close, volume)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (symbol, date) DO UPDATE
                SET open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    adj_close = EXCLUDED.adj_close,
                    volume = EXCLUDED.volume
                "#,
            )
            .bind(&record.symbol)
            .bind(record.date)
            .bind(record.open)
            .bind(record.high)
            .bind(record.low)
            .bind(record.close)
            .bind(record.adj_close)
            .bind(record.volume)
            .execute(&mut *tx)
            .await
            .context("Failed to upsert price record")?;

            written += result.rows_affected();
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(written)
    }

    /// Queries all price rows for a symbol, ascending by date.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn query_by_symbol(&self, symbol: &str) -> Result<Vec<PriceRecord>> {
        let records = sqlx::query_as::<_, PriceRecord>(
            r#"
            SELECT symbol, date, open, high, low, close, adj_close, volume
            FROM price_history
            WHERE symbol = $1
            ORDER BY date ASC
            "#,
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query price history")?;

        Ok(records)
    }

    /// Counts stored rows for a symbol.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn count_for_symbol(&self, symbol: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM price_history
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count price history")?;

        Ok(row.0)
    }
}
