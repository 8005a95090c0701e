//! Database repositories for the stock tracking pipeline.
//!
//! Each repository provides typed access to a specific table. The loader
//! and deadletter writes are batch/transactional; everything else is
//! single-statement.

pub mod deadletter_repo;
pub mod price_repo;
pub mod tracked_stock_repo;

pub use deadletter_repo::DeadletterRepository;
pub use price_repo::PriceRepository;
pub use tracked_stock_repo::TrackedStockRepository;

use sqlx::PgPool;

/// Creates all repositories from a single database pool.
pub struct Repositories {
    pub prices: PriceRepository,
    pub tracked: TrackedStockRepository,
    pub deadletter: DeadletterRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            prices: PriceRepository::new(pool.clone()),
            tracked: TrackedStockRepository::new(pool.clone()),
            deadletter: DeadletterRepository::new(pool),
        }
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would go here, requiring a test database.
    // For unit tests, see individual repository modules.
}
