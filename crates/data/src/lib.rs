//! Data storage and management for the stock tracking pipeline.
//!
//! This crate provides:
//! - Database client for `PostgreSQL`
//! - Data models for price history, tracked stocks and the deadletter queue
//! - Repositories for typed database access

pub mod database;
pub mod models;
pub mod repositories;

pub use database::DatabaseClient;

// Re-export models
pub use models::{next_retry_at, DeadletterEntry, PriceRecord, PullStatus, TrackedStock};

// Re-export repositories
pub use repositories::{
    DeadletterRepository, PriceRepository, Repositories, TrackedStockRepository,
};
