//! # Trade Error Types
//!
//! Every stage owns a narrow error enum ([`ParseError`], [`SourceError`],
//! [`BatchError`], [`StorageError`]). `TradeError` wraps them with the context of the
//! stage that failed (file path, chunk ordinal) and is what the services return.

use std::path::PathBuf;
use thiserror::Error;

use crate::batching::BatchError;
use crate::config::ConfigurationError;
use crate::parser::ParseError;
use crate::source::SourceError;
use crate::storage::StorageError;

/// Errors surfaced by the ingestion and aggregation services
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Parse error in file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Batch error in file {}: {source}", path.display())]
    Batch {
        path: PathBuf,
        #[source]
        source: BatchError,
    },

    #[error("Database save batch error {batch} in file {}: {source}", path.display())]
    SaveBatch {
        path: PathBuf,
        batch: usize,
        #[source]
        source: StorageError,
    },

    #[error("File read error: {0}")]
    Source(#[from] SourceError),

    #[error("Fetching aggregated data error: {0}")]
    Aggregation(#[source] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Ingestion cancelled")]
    Cancelled,
}

impl TradeError {
    /// Create a validation error for a missing or malformed input field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the caller supplied bad input.
    ///
    /// An HTTP layer maps this to a 4xx response and every other variant to a 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, TradeError>;
