//! # Database Operations
//!
//! Connection management and schema migrations for the PostgreSQL backend.
//!
//! - [`connection`] - Pool creation from [`crate::config::DatabaseConfig`] with a ping check
//! - [`migrations`] - Embedded schema migrations for the `trades` table
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trade_ingestor::config::DatabaseConfig;
//! use trade_ingestor::database::{DatabaseConnection, DatabaseMigrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseConnection::connect(&DatabaseConfig::default()).await?;
//! DatabaseMigrations::run_all(db.pool()).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::DatabaseMigrations;
