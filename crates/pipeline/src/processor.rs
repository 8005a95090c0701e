//! Processor: the per-document workflow.
//!
//! Drives each staged document through parse and load, and owns every
//! lifecycle transition: staged documents end up in `done/` or
//! `deadletter/`, with failures recorded on the deadletter queue. Parser
//! and loader stay stateless about document placement. Documents are
//! processed independently; one failure never aborts the rest.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use stock_track_data::DeadletterRepository;
use stock_track_fetch::{RawDocument, StagingArea};
use stock_track_parse::HistoryParser;

use crate::loader::Loader;

/// Terminal state of one document after a processing pass.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    /// Parsed and fully loaded; relocated to `done/`.
    Done {
        doc_id: String,
        records_loaded: u64,
        dropped_rows: usize,
    },
    /// Parse or load failure; relocated to `deadletter/`.
    Deadlettered {
        doc_id: String,
        symbol: String,
        reason: String,
    },
}

impl DocumentOutcome {
    /// True for the happy path.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, DocumentOutcome::Done { .. })
    }
}

/// Orchestrates parse + load + lifecycle transitions per document.
pub struct Processor {
    staging: StagingArea,
    loader: Loader,
    deadletter: DeadletterRepository,
    retry_interval_hours: i64,
}

impl Processor {
    /// Creates a new processor.
    #[must_use]
    pub fn new(
        staging: StagingArea,
        loader: Loader,
        deadletter: DeadletterRepository,
        retry_interval_hours: i64,
    ) -> Self {
        Self {
            staging,
            loader,
            deadletter,
            retry_interval_hours,
        }
    }

    /// The staging area this processor owns transitions for.
    #[must_use]
    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Processes every currently staged document.
    ///
    /// Failures are deadlettered per document: the file moves to
    /// `deadletter/` and an entry is enqueued with the reason. A
    /// document whose lifecycle transition itself fails (filesystem
    /// trouble) is logged and skipped; it stays staged and is retried on
    /// the next scan.
    ///
    /// # Errors
    /// Returns an error only if the staging area cannot be enumerated.
    pub async fn process_staged(&self) -> Result<Vec<DocumentOutcome>> {
        let documents = self
            .staging
            .list_staged()
            .context("Failed to enumerate staged documents")?;

        let mut outcomes = Vec::with_capacity(documents.len());

        for doc in &documents {
            match self.process_document(doc).await {
                Ok(outcome) => {
                    if let DocumentOutcome::Deadlettered {
                        doc_id,
                        symbol,
                        reason,
                    } = &outcome
                    {
                        if let Err(e) = self
                            .deadletter
                            .enqueue(doc_id, symbol, reason, Utc::now(), self.retry_interval_hours)
                            .await
                        {
                            error!(doc_id = %doc_id, error = %e, "failed to enqueue deadletter entry");
                        }
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    error!(doc_id = %doc.doc_id, error = %e, "document lifecycle transition failed");
                }
            }
        }

        Ok(outcomes)
    }

    /// Runs one document through the state machine from `Discovered`.
    ///
    /// This is also the re-entry point for deadletter retries; the
    /// document's current location is wherever the last transition left
    /// it.
    ///
    /// # Errors
    /// Returns an error only when the terminal file move fails; parse
    /// and load failures are data, not errors, and come back as
    /// [`DocumentOutcome::Deadlettered`].
    pub async fn process_document(&self, doc: &RawDocument) -> Result<DocumentOutcome> {
        let body = match self.staging.read(doc) {
            Ok(body) => body,
            Err(e) => return self.deadletter_document(doc, &format!("unreadable document: {e}")),
        };

        let parsed = match HistoryParser::parse(&body, &doc.symbol) {
            Ok(parsed) => parsed,
            // Structural failure: the document is the problem, not a row.
            Err(e) => return self.deadletter_document(doc, &e.to_string()),
        };

        if parsed.dropped_rows > 0 {
            warn!(
                doc_id = %doc.doc_id,
                dropped = parsed.dropped_rows,
                "some rows failed validation"
            );
        }

        let dropped_rows = parsed.dropped_rows;
        let load = self.loader.load(parsed.records).await;

        if !load.is_complete() {
            let reason = format!(
                "{} of {} batches failed: {}",
                load.failures.len(),
                load.batches_committed + load.failures.len(),
                load.failures
                    .first()
                    .map_or_else(String::new, |f| f.error.clone())
            );
            return self.deadletter_document(doc, &reason);
        }

        self.staging
            .mark_done(doc)
            .with_context(|| format!("Failed to mark {} done", doc.doc_id))?;

        info!(
            doc_id = %doc.doc_id,
            records = load.records_loaded,
            dropped = dropped_rows,
            "document processed"
        );

        Ok(DocumentOutcome::Done {
            doc_id: doc.doc_id.clone(),
            records_loaded: load.records_loaded,
            dropped_rows,
        })
    }

    fn deadletter_document(&self, doc: &RawDocument, reason: &str) -> Result<DocumentOutcome> {
        warn!(doc_id = %doc.doc_id, reason, "deadlettering document");
        self.staging
            .mark_deadletter(doc)
            .with_context(|| format!("Failed to deadletter {}", doc.doc_id))?;

        Ok(DocumentOutcome::Deadlettered {
            doc_id: doc.doc_id.clone(),
            symbol: doc.symbol.clone(),
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        let done = DocumentOutcome::Done {
            doc_id: "AAPL-20250801T120000Z".to_string(),
            records_loaded: 10,
            dropped_rows: 0,
        };
        assert!(done.is_done());

        let parked = DocumentOutcome::Deadlettered {
            doc_id: "AAPL-20250801T120000Z".to_string(),
            symbol: "AAPL".to_string(),
            reason: "no price table found in document".to_string(),
        };
        assert!(!parked.is_done());
    }

    // Parse and load behavior is covered in stock-track-parse and
    // loader.rs; the full state machine over a real staging directory
    // and database belongs in integration tests with a test Postgres.
}
