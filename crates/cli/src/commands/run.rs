//! Daemon and single-cycle commands.

use anyhow::Result;

use stock_track_pipeline::IngestScheduler;

use super::build_pipeline;

/// Runs the ingestion scheduler until interrupted.
///
/// # Errors
/// Returns an error if the pipeline cannot be wired or the scheduler
/// fails to start.
pub async fn run_daemon(config_path: &str) -> Result<()> {
    let (config, pipeline) = build_pipeline(config_path).await?;
    let scheduler = IngestScheduler::new(config.scheduler, pipeline);
    scheduler.start().await
}

/// Executes one ingestion cycle and prints the report.
///
/// # Errors
/// Returns an error if the pipeline cannot be wired or the cycle fails
/// outright.
pub async fn run_cycle(config_path: &str) -> Result<()> {
    let (config, pipeline) = build_pipeline(config_path).await?;
    let scheduler = IngestScheduler::new(config.scheduler, pipeline);
    let report = scheduler.run_once().await?;

    println!("Cycle complete:");
    println!("  symbols:       {}", report.active_symbols);
    println!(
        "  fetched:       {} ({} failed)",
        report.fetched, report.fetch_failures
    );
    println!("  processed:     {}", report.documents_done);
    println!("  deadlettered:  {}", report.documents_deadlettered);
    println!(
        "  retries:       {} attempted, {} resolved, {} abandoned",
        report.retries.attempted, report.retries.resolved, report.retries.abandoned
    );

    Ok(())
}
