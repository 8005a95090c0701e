//! CLI commands for the stock tracking pipeline.

pub mod deadletter;
pub mod fetch;
pub mod process;
pub mod run;
pub mod status;
pub mod track;

pub use deadletter::{run_deadletter_list, run_deadletter_retry};
pub use fetch::run_fetch;
pub use process::run_process;
pub use run::{run_cycle, run_daemon};
pub use status::run_status;
pub use track::{run_track, run_untrack};

use anyhow::{Context, Result};
use std::sync::Arc;

use stock_track_core::{AppConfig, ConfigLoader};
use stock_track_data::{DatabaseClient, Repositories};
use stock_track_fetch::{HistoryClient, Retriever, StagingArea};
use stock_track_pipeline::{DeadletterService, IngestPipeline, Loader, Processor};

/// Loads configuration and wires the full pipeline together.
///
/// # Errors
/// Returns an error if configuration, database connection, staging
/// directories or the HTTP client cannot be set up.
pub(crate) async fn build_pipeline(config_path: &str) -> Result<(AppConfig, Arc<IngestPipeline>)> {
    let config = ConfigLoader::load_from(config_path).context("Failed to load configuration")?;

    let db = DatabaseClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    let repos = Repositories::new(db.pool());

    let staging =
        StagingArea::open(&config.staging.root).context("Failed to open staging area")?;

    let client = HistoryClient::new(&config.retriever).context("Failed to build HTTP client")?;
    let retriever = Retriever::new(client, staging.clone(), repos.tracked.clone());

    let loader = Loader::new(repos.prices.clone(), config.loader.batch_size);
    let processor = Processor::new(
        staging.clone(),
        loader,
        repos.deadletter.clone(),
        config.deadletter.retry_interval_hours,
    );
    let deadletter = DeadletterService::new(
        repos.deadletter.clone(),
        staging,
        config.deadletter.retry_interval_hours,
        config.deadletter.retry_ceiling,
    );

    let pipeline = Arc::new(IngestPipeline {
        tracked: repos.tracked,
        retriever,
        processor,
        deadletter,
    });

    Ok((config, pipeline))
}
