//! Worklist maintenance commands.

use anyhow::Result;

use super::build_pipeline;

/// Adds a symbol to the tracking worklist (or reactivates it).
///
/// # Errors
/// Returns an error if wiring or the database write fails.
pub async fn run_track(config_path: &str, symbol: &str) -> Result<()> {
    let (_config, pipeline) = build_pipeline(config_path).await?;
    let symbol = symbol.to_uppercase();
    pipeline.tracked.track(&symbol).await?;
    println!("Tracking {symbol}");
    Ok(())
}

/// Deactivates a tracked symbol. The row and its pull history remain.
///
/// # Errors
/// Returns an error if wiring or the database write fails.
pub async fn run_untrack(config_path: &str, symbol: &str) -> Result<()> {
    let (_config, pipeline) = build_pipeline(config_path).await?;
    let symbol = symbol.to_uppercase();
    pipeline.tracked.deactivate(&symbol).await?;
    println!("Untracked {symbol}");
    Ok(())
}
