//! # Trade Storage
//!
//! Storage is exposed as two narrow capabilities: [`TradeWriter`] for bulk
//! inserts and [`AggregationReader`] for the windowed query. [`TradeStore`] is
//! the combination, implemented for anything that provides both.

pub mod postgres;

pub use postgres::PgTradeStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Trade;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("pool error: {0}")]
    Acquire(#[source] sqlx::Error),

    #[error("sql copy error: {0}")]
    Copy(#[source] sqlx::Error),

    #[error("copy payload encoding error: {0}")]
    Encode(String),

    #[error("error querying aggregated data: {0}")]
    Query(#[source] sqlx::Error),

    #[error("no trades found for {ticker} since {start}")]
    NotFound { ticker: String, start: NaiveDate },

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    pub fn not_found(ticker: impl Into<String>, start: NaiveDate) -> Self {
        Self::NotFound {
            ticker: ticker.into(),
            start,
        }
    }
}

/// Bulk persistence of trade batches
#[async_trait]
pub trait TradeWriter: Send + Sync {
    /// Persist every trade in `trades` and return how many rows were accepted.
    /// An empty batch is a no-op returning zero.
    async fn save_batch(&self, trades: Vec<Trade>) -> Result<u64, StorageError>;
}

/// Windowed max-price / max-daily-volume query
#[async_trait]
pub trait AggregationReader: Send + Sync {
    /// Returns `(max price, max per-day summed quantity)` for `ticker` on or after
    /// `start`, or [`StorageError::NotFound`] when no trade matches.
    async fn aggregated(&self, ticker: &str, start: NaiveDate)
        -> Result<(Decimal, i64), StorageError>;
}

/// Both storage capabilities
pub trait TradeStore: TradeWriter + AggregationReader {}

impl<T> TradeStore for T where T: TradeWriter + AggregationReader + ?Sized {}
