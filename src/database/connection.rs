use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::storage::StorageError;

/// Bounded PostgreSQL pool shared by the trade store
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Build the pool from configuration and verify it with a ping
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            acquire_timeout_seconds = config.acquire_timeout_seconds,
            "Initializing database pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(StorageError::Connection)?;

        let db = Self { pool };
        if let Err(err) = db.health_check().await {
            db.pool.close().await;
            return Err(err);
        }

        info!(size = db.pool.size(), "Database pool initialized successfully");
        Ok(db)
    }

    /// Wrap an existing pool, e.g. one handed out by a test harness
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StorageError::Connection)?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
