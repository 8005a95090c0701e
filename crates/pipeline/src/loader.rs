//! Loader: validated, deduplicated, batched upserts into price storage.
//!
//! Batches keep each transaction far below the storage layer's
//! bind-parameter ceiling. A failed batch rolls back and is reported;
//! sibling batches commit independently.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{error, info};

use stock_track_data::{PriceRecord, PriceRepository};
use stock_track_parse::sort_by_date;

/// One failed batch inside an otherwise independent load.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// Zero-based batch position within this load.
    pub batch_index: usize,
    /// Records the batch carried.
    pub records: usize,
    /// Stringified storage error.
    pub error: String,
}

/// Summary of one load call.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    /// Rows written (inserted or overwritten) across committed batches.
    pub records_loaded: u64,
    /// Records rejected by domain validation before any write.
    pub invalid_records: usize,
    /// Records collapsed by (symbol, date) deduplication.
    pub duplicate_records: usize,
    /// Batches that committed.
    pub batches_committed: usize,
    /// Batches that rolled back, with their errors.
    pub failures: Vec<BatchFailure>,
}

impl LoadResult {
    /// True when every batch committed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sorts, validates and deduplicates records ahead of the write path.
///
/// Deduplication is last-wins per (symbol, date): with the input sorted
/// by date, the surviving value for a re-listed date is the one the
/// source listed last, matching upsert overwrite semantics.
///
/// Returns the surviving records plus (invalid, duplicate) counts.
#[must_use]
pub fn prepare(mut records: Vec<PriceRecord>) -> (Vec<PriceRecord>, usize, usize) {
    sort_by_date(&mut records);

    let before = records.len();
    records.retain(PriceRecord::is_valid);
    let invalid = before - records.len();

    let mut index: HashMap<(String, NaiveDate), usize> = HashMap::new();
    let mut deduped: Vec<PriceRecord> = Vec::with_capacity(records.len());
    let mut duplicates = 0usize;

    for record in records {
        let key = (record.symbol.clone(), record.date);
        match index.get(&key) {
            Some(&slot) => {
                deduped[slot] = record;
                duplicates += 1;
            }
            None => {
                index.insert(key, deduped.len());
                deduped.push(record);
            }
        }
    }

    (deduped, invalid, duplicates)
}

/// Batched upsert loader over the price repository.
pub struct Loader {
    prices: PriceRepository,
    batch_size: usize,
}

impl Loader {
    /// Creates a new loader.
    #[must_use]
    pub fn new(prices: PriceRepository, batch_size: usize) -> Self {
        Self {
            prices,
            batch_size: batch_size.max(1),
        }
    }

    /// Loads records into storage in independent batches.
    ///
    /// Each batch is one transaction; a batch failure is rolled back by
    /// the repository and recorded here without aborting the remaining
    /// batches. Loading the same record set twice leaves storage
    /// unchanged, courtesy of the (symbol, date) upsert.
    pub async fn load(&self, records: Vec<PriceRecord>) -> LoadResult {
        let (records, invalid_records, duplicate_records) = prepare(records);

        let mut result = LoadResult {
            invalid_records,
            duplicate_records,
            ..LoadResult::default()
        };

        for (batch_index, batch) in records.chunks(self.batch_size).enumerate() {
            match self.prices.upsert_batch(batch).await {
                Ok(written) => {
                    result.records_loaded += written;
                    result.batches_committed += 1;
                }
                Err(e) => {
                    error!(batch_index, records = batch.len(), error = %e, "batch upsert failed");
                    result.failures.push(BatchFailure {
                        batch_index,
                        records: batch.len(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            loaded = result.records_loaded,
            invalid = result.invalid_records,
            duplicates = result.duplicate_records,
            failed_batches = result.failures.len(),
            "load finished"
        );
        result
    }
}
