use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Connection handle for the pipeline's Postgres storage.
///
/// The pipeline is a client of the schema, not its owner; migrations live
/// with the storage collaborator.
pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Returns the underlying connection pool for repository construction.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}
