//! # Batching
//!
//! Order-preserving chunking of an owned sequence. Elements are moved into the
//! chunks, so the caller hands ownership over and nothing is cloned.

use thiserror::Error;

/// Chunk size used by the ingestion pipeline when none is configured
pub const DEFAULT_BATCH_SIZE: usize = 5000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch size must be greater than 0")]
    InvalidSize,
}

/// Split `items` into chunks of `size`, keeping element order.
///
/// Every chunk holds exactly `size` elements except the last, which holds the
/// remainder. An empty input yields no chunks at all.
pub fn batch<T>(items: Vec<T>, size: usize) -> Result<Vec<Vec<T>>, BatchError> {
    if size == 0 {
        return Err(BatchError::InvalidSize);
    }

    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        batches.push(items.by_ref().take(size).collect());
    }

    Ok(batches)
}
