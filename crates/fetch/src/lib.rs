//! Historical-data retrieval for the stock tracking pipeline.
//!
//! This crate provides:
//! - A retrying HTTP client with rate limiting and 429 handling
//! - A filesystem staging area with atomic state transitions
//! - The retriever that ties fetching, staging and pull-status updates
//!   together

pub mod client;
pub mod error;
pub mod retriever;
pub mod staging;

pub use client::{HistoryClient, HttpPageSource, PageSource, RetryPolicy};
pub use error::RetrievalError;
pub use retriever::Retriever;
pub use staging::{doc_id, RawDocument, StagingArea};
