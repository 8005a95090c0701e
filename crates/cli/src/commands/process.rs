//! Process currently staged documents.

use anyhow::Result;

use stock_track_pipeline::DocumentOutcome;

use super::build_pipeline;

/// Runs the processor over everything in the staging area.
///
/// # Errors
/// Returns an error if wiring fails or the staging area cannot be read.
pub async fn run_process(config_path: &str) -> Result<()> {
    let (_config, pipeline) = build_pipeline(config_path).await?;

    let outcomes = pipeline.processor.process_staged().await?;
    if outcomes.is_empty() {
        println!("Nothing staged.");
        return Ok(());
    }

    let mut done = 0usize;
    let mut deadlettered = 0usize;
    for outcome in &outcomes {
        match outcome {
            DocumentOutcome::Done {
                doc_id,
                records_loaded,
                dropped_rows,
            } => {
                done += 1;
                println!("Done {doc_id}: {records_loaded} records, {dropped_rows} dropped");
            }
            DocumentOutcome::Deadlettered { doc_id, reason, .. } => {
                deadlettered += 1;
                println!("Deadlettered {doc_id}: {reason}");
            }
        }
    }

    println!("{done} processed, {deadlettered} deadlettered");
    Ok(())
}
