//! # Services
//!
//! [`IngestionService`] loads trade files into storage and [`AggregationService`]
//! answers the windowed query. [`TradeService`] wires both to one store and is
//! the entry point the binary uses.

pub mod aggregation;
pub mod ingestion;

pub use aggregation::{AggregationService, DEFAULT_WINDOW_DAYS};
pub use ingestion::{IngestionService, IngestionSummary};

use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::TradeError;
use crate::models::AggregatedData;
use crate::parser::TradeColumns;
use crate::source::SourceReader;
use crate::storage::TradeStore;

#[derive(Clone)]
pub struct TradeService {
    ingestion: IngestionService,
    aggregation: AggregationService,
}

impl TradeService {
    pub fn new<S>(store: Arc<S>, source: Arc<dyn SourceReader>) -> Self
    where
        S: TradeStore + 'static,
    {
        Self {
            ingestion: IngestionService::new(source, store.clone()),
            aggregation: AggregationService::new(store),
        }
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            ingestion: self.ingestion.with_clock(clock.clone()),
            aggregation: self.aggregation.with_clock(clock),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.ingestion = self.ingestion.with_batch_size(batch_size);
        self
    }

    pub fn with_columns(mut self, columns: TradeColumns) -> Self {
        self.ingestion = self.ingestion.with_columns(columns);
        self
    }

    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.aggregation = self.aggregation.with_window_days(window_days);
        self
    }

    pub async fn ingest_files(
        &self,
        path: &Path,
        cancel: CancellationToken,
    ) -> Result<IngestionSummary, TradeError> {
        self.ingestion.ingest_files(path, cancel).await
    }

    pub async fn get_aggregated_data(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
    ) -> Result<AggregatedData, TradeError> {
        self.aggregation.get_aggregated_data(ticker, start).await
    }

    pub fn ingestion(&self) -> &IngestionService {
        &self.ingestion
    }

    pub fn aggregation(&self) -> &AggregationService {
        &self.aggregation
    }
}
