//! Orchestration for the stock tracking pipeline.
//!
//! This crate provides:
//! - The batched, idempotent loader over price storage
//! - The per-document processor state machine
//! - The deadletter retry service
//! - The periodic ingestion scheduler tying it all together

pub mod deadletter;
pub mod loader;
pub mod processor;
pub mod scheduler;

pub use deadletter::{DeadletterService, RetryReport};
pub use loader::{BatchFailure, LoadResult, Loader};
pub use processor::{DocumentOutcome, Processor};
pub use scheduler::{CycleReport, IngestPipeline, IngestScheduler};
