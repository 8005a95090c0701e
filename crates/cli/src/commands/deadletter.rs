//! Deadletter queue operator commands.

use anyhow::Result;

use super::build_pipeline;

/// Lists every deadletter entry, live and abandoned.
///
/// # Errors
/// Returns an error if wiring fails or the queue cannot be read.
pub async fn run_deadletter_list(config_path: &str) -> Result<()> {
    let (_config, pipeline) = build_pipeline(config_path).await?;

    let entries = pipeline.deadletter.list().await?;
    if entries.is_empty() {
        println!("Deadletter queue is empty.");
        return Ok(());
    }

    println!(
        "{:<28} {:<8} {:>7} {:<20} {:<9} reason",
        "doc_id", "symbol", "retries", "next_retry_at", "state"
    );
    for entry in entries {
        let state = if entry.abandoned { "abandoned" } else { "queued" };
        println!(
            "{:<28} {:<8} {:>7} {:<20} {:<9} {}",
            entry.doc_id,
            entry.symbol,
            entry.retry_count,
            entry.next_retry_at.format("%Y-%m-%d %H:%M:%S"),
            state,
            entry.reason
        );
    }

    Ok(())
}

/// Retries every due entry through the processor.
///
/// # Errors
/// Returns an error if wiring fails or the due list cannot be read.
pub async fn run_deadletter_retry(config_path: &str) -> Result<()> {
    let (_config, pipeline) = build_pipeline(config_path).await?;

    let report = pipeline.deadletter.retry_due(&pipeline.processor).await?;
    println!(
        "{} attempted, {} resolved, {} requeued, {} abandoned",
        report.attempted, report.resolved, report.requeued, report.abandoned
    );

    Ok(())
}
