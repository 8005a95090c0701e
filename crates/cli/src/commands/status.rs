//! Tracked-stock status command.
//!
//! Reads the same pull-status fields the trigger API exposes, plus
//! stored record counts per symbol.

use anyhow::{Context, Result};

use stock_track_core::ConfigLoader;
use stock_track_data::{DatabaseClient, Repositories, TrackedStock};

/// Shows pull status and record counts for tracked symbols.
///
/// # Errors
/// Returns an error if configuration loading or database access fails.
pub async fn run_status(config_path: &str, symbol: Option<&str>) -> Result<()> {
    let config = ConfigLoader::load_from(config_path).context("Failed to load configuration")?;
    let db = DatabaseClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    let repos = Repositories::new(db.pool());

    let stocks: Vec<TrackedStock> = match symbol {
        Some(symbol) => {
            let symbol = symbol.to_uppercase();
            match repos.tracked.get(&symbol).await? {
                Some(stock) => vec![stock],
                None => {
                    println!("{symbol} is not tracked.");
                    return Ok(());
                }
            }
        }
        None => repos.tracked.list_active().await?,
    };

    if stocks.is_empty() {
        println!("No tracked symbols.");
        return Ok(());
    }

    println!(
        "{:<8} {:<8} {:<9} {:<20} {:>8} error",
        "symbol", "active", "status", "last_pull_at", "records"
    );
    for stock in stocks {
        let records = repos.prices.count_for_symbol(&stock.symbol).await?;
        let last_pull = stock
            .last_pull_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "{:<8} {:<8} {:<9} {:<20} {:>8} {}",
            stock.symbol,
            if stock.active { "yes" } else { "no" },
            stock.last_pull_status,
            last_pull,
            records,
            stock.error_message.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
