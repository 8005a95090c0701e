//! Retriever: fetch one symbol's history page and stage it.
//!
//! Owns RawDocument creation and the pull-status bookkeeping on the
//! tracked-stock row. No parsing happens here; the staged payload is the
//! verbatim response body.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info};

use stock_track_data::TrackedStockRepository;

use crate::client::HistoryClient;
use crate::staging::{RawDocument, StagingArea};

/// Fetches history pages and stages them for the processor.
pub struct Retriever {
    client: HistoryClient,
    staging: StagingArea,
    tracked: TrackedStockRepository,
}

impl Retriever {
    /// Creates a new retriever.
    #[must_use]
    pub fn new(
        client: HistoryClient,
        staging: StagingArea,
        tracked: TrackedStockRepository,
    ) -> Self {
        Self {
            client,
            staging,
            tracked,
        }
    }

    /// Fetches a symbol's history page, persists it verbatim to the
    /// staging area, and records the pull outcome on the tracked stock.
    ///
    /// Transient HTTP failures are retried inside the client and never
    /// surface here; what arrives is either a page body, an exhausted
    /// retry budget, or a permanent failure. Both failure shapes are
    /// recorded on the tracked-stock row before propagating.
    ///
    /// # Errors
    /// Returns an error if retrieval ultimately fails or the payload
    /// cannot be staged.
    pub async fn fetch(&self, symbol: &str) -> Result<RawDocument> {
        match self.client.fetch_page(symbol).await {
            Ok(body) => {
                let fetched_at = Utc::now();
                let doc = self
                    .staging
                    .stage(symbol, fetched_at, &body)
                    .with_context(|| format!("Failed to stage document for {symbol}"))?;

                self.tracked
                    .record_pull_success(symbol, fetched_at)
                    .await
                    .context("Failed to record pull success")?;

                info!(symbol, doc_id = %doc.doc_id, bytes = body.len(), "staged history page");
                Ok(doc)
            }
            Err(e) => {
                error!(symbol, error = %e, "history pull failed");
                self.tracked
                    .record_pull_failure(symbol, Utc::now(), &e.to_string())
                    .await
                    .context("Failed to record pull failure")?;

                Err(e).with_context(|| format!("Failed to fetch history for {symbol}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // The retry loop, backoff schedule and staging lifecycle are covered
    // in client.rs and staging.rs. Exercising Retriever::fetch end to end
    // requires a tracked_stocks table; integration tests with a real
    // database would live here.
    //
    // #[tokio::test]
    // async fn test_fetch_records_success_status() {
    //     let pool = setup_test_database().await;
    //     let retriever = Retriever::new(client, staging, TrackedStockRepository::new(pool));
    //     retriever.fetch("AAPL").await.unwrap();
    //     let stock = repo.get("AAPL").await.unwrap().unwrap();
    //     assert_eq!(stock.last_pull_status, "success");
    // }
}
