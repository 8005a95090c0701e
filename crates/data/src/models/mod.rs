//! Data models for the stock tracking pipeline.

pub mod deadletter;
pub mod price;
pub mod tracked_stock;

pub use deadletter::{next_retry_at, DeadletterEntry};
pub use price::PriceRecord;
pub use tracked_stock::{PullStatus, TrackedStock};
