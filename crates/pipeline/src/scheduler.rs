//! Periodic ingestion scheduler.
//!
//! Each cycle fetches every active symbol under bounded concurrency,
//! processes newly staged documents, and re-attempts due deadletter
//! entries. Failures degrade to recorded state; nothing here is allowed
//! to take the scheduler process down.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use stock_track_core::SchedulerConfig;
use stock_track_data::TrackedStockRepository;
use stock_track_fetch::Retriever;

use crate::deadletter::{DeadletterService, RetryReport};
use crate::processor::Processor;

/// The components one ingestion cycle drives.
pub struct IngestPipeline {
    pub tracked: TrackedStockRepository,
    pub retriever: Retriever,
    pub processor: Processor,
    pub deadletter: DeadletterService,
}

/// Counts from one scheduler cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleReport {
    /// Symbols on the active worklist this cycle.
    pub active_symbols: usize,
    /// Symbols whose page was fetched and staged.
    pub fetched: usize,
    /// Symbols whose fetch failed or timed out.
    pub fetch_failures: usize,
    /// Documents that reached `done/`.
    pub documents_done: usize,
    /// Documents routed to the deadletter queue.
    pub documents_deadlettered: usize,
    /// Deadletter retry counts.
    pub retries: RetryReport,
}

/// Cron-driven ingestion scheduler.
pub struct IngestScheduler {
    config: SchedulerConfig,
    pipeline: Arc<IngestPipeline>,
}

impl IngestScheduler {
    /// Creates a new scheduler.
    #[must_use]
    pub fn new(config: SchedulerConfig, pipeline: Arc<IngestPipeline>) -> Self {
        Self { config, pipeline }
    }

    /// Starts the scheduler and runs cycles on the configured schedule.
    ///
    /// # Errors
    /// Returns an error if the scheduler fails to start or if job
    /// scheduling fails.
    pub async fn start(self) -> Result<()> {
        if !self.config.enabled {
            info!("Ingestion scheduler is disabled");
            return Ok(());
        }

        info!(
            "Starting ingestion scheduler with cron: {}",
            self.config.cron_schedule
        );

        let scheduler = JobScheduler::new().await?;
        let config = self.config.clone();
        let pipeline = self.pipeline.clone();
        let cron_schedule = config.cron_schedule.clone();

        let job = Job::new_async(cron_schedule.as_str(), move |_uuid, _lock| {
            let config = config.clone();
            let pipeline = pipeline.clone();
            Box::pin(async move {
                if let Err(e) = run_cycle(config, pipeline).await {
                    error!("Ingestion cycle failed: {}", e);
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Ingestion scheduler started successfully");

        // Keep scheduler running
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    /// Runs a single cycle manually (one-time execution).
    ///
    /// # Errors
    /// Returns an error if the cycle times out or its worklist cannot be
    /// read.
    pub async fn run_once(&self) -> Result<CycleReport> {
        run_cycle(self.config.clone(), self.pipeline.clone()).await
    }
}

async fn run_cycle(config: SchedulerConfig, pipeline: Arc<IngestPipeline>) -> Result<CycleReport> {
    let budget = Duration::from_secs(config.cycle_timeout_secs);
    match tokio::time::timeout(budget, cycle_inner(&config, &pipeline)).await {
        Ok(result) => result,
        Err(_) => anyhow::bail!(
            "ingestion cycle exceeded {}s budget",
            config.cycle_timeout_secs
        ),
    }
}

async fn cycle_inner(
    config: &SchedulerConfig,
    pipeline: &Arc<IngestPipeline>,
) -> Result<CycleReport> {
    let stocks = pipeline
        .tracked
        .list_active()
        .await
        .context("Failed to list tracked symbols")?;

    let mut report = CycleReport {
        active_symbols: stocks.len(),
        ..CycleReport::default()
    };

    info!("Running ingestion cycle for {} symbols", stocks.len());

    // Fan out fetches under the concurrency bound; each task carries its
    // own timeout so a hung fetch is cancelled without touching siblings.
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
    let fetch_timeout = Duration::from_secs(config.fetch_timeout_secs);
    let mut handles = Vec::with_capacity(stocks.len());

    for stock in stocks {
        let semaphore = semaphore.clone();
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return false;
            };

            match tokio::time::timeout(fetch_timeout, pipeline.retriever.fetch(&stock.symbol)).await
            {
                Ok(Ok(_doc)) => true,
                Ok(Err(e)) => {
                    error!(symbol = %stock.symbol, error = %e, "fetch failed");
                    false
                }
                Err(_) => {
                    warn!(symbol = %stock.symbol, "fetch timed out, cancelled");
                    if let Err(e) = pipeline
                        .tracked
                        .record_pull_failure(&stock.symbol, Utc::now(), "fetch timed out")
                        .await
                    {
                        error!(symbol = %stock.symbol, error = %e, "failed to record timeout");
                    }
                    false
                }
            }
        }));
    }

    for handle in handles {
        match handle.await {
            Ok(true) => report.fetched += 1,
            Ok(false) => report.fetch_failures += 1,
            Err(e) => {
                report.fetch_failures += 1;
                error!(error = %e, "fetch task panicked");
            }
        }
    }

    let outcomes = pipeline.processor.process_staged().await?;
    for outcome in &outcomes {
        if outcome.is_done() {
            report.documents_done += 1;
        } else {
            report.documents_deadlettered += 1;
        }
    }

    report.retries = pipeline.deadletter.retry_due(&pipeline.processor).await?;

    info!(
        fetched = report.fetched,
        fetch_failures = report.fetch_failures,
        done = report.documents_done,
        deadlettered = report.documents_deadlettered,
        retried = report.retries.attempted,
        "ingestion cycle finished"
    );

    Ok(report)
}
