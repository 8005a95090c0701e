//! One-shot fetch-and-process command for a single symbol.

use anyhow::Result;

use stock_track_pipeline::DocumentOutcome;

use super::build_pipeline;

/// Fetches a symbol's history page and processes whatever is staged.
///
/// # Errors
/// Returns an error if wiring, retrieval or processing fails.
pub async fn run_fetch(config_path: &str, symbol: &str) -> Result<()> {
    let (_config, pipeline) = build_pipeline(config_path).await?;

    let symbol = symbol.to_uppercase();
    let doc = pipeline.retriever.fetch(&symbol).await?;
    println!("Staged {}", doc.doc_id);

    let outcomes = pipeline.processor.process_staged().await?;
    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Done {
                doc_id,
                records_loaded,
                dropped_rows,
            } => {
                println!(
                    "Done {doc_id}: {records_loaded} records loaded, {dropped_rows} rows dropped"
                );
            }
            DocumentOutcome::Deadlettered { doc_id, reason, .. } => {
                println!("Deadlettered {doc_id}: {reason}");
            }
        }
    }

    Ok(())
}
