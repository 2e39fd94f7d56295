//! # Schema Migrations
//!
//! Migrations live in `migrations/` as `YYYYMMDDHHMMSS_description.sql` and are
//! embedded at compile time. sqlx tracks applied versions in `_sqlx_migrations`
//! and serializes concurrent runners with a PostgreSQL advisory lock, so running
//! them from every process start is safe.

use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::info;

use crate::storage::StorageError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Apply every migration that has not run yet
    pub async fn run_all(pool: &PgPool) -> Result<(), StorageError> {
        MIGRATOR.run(pool).await?;
        info!(
            migrations = MIGRATOR.iter().count(),
            "migrations finished"
        );
        Ok(())
    }

    /// Versions of the embedded migrations, oldest first
    pub fn versions() -> Vec<i64> {
        MIGRATOR.iter().map(|migration| migration.version).collect()
    }
}
