use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::clock::{Clock, SystemClock};
use crate::error::TradeError;
use crate::models::AggregatedData;
use crate::storage::AggregationReader;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Answers the max-price / max-daily-volume query for one ticker
#[derive(Clone)]
pub struct AggregationService {
    reader: Arc<dyn AggregationReader>,
    clock: Arc<dyn Clock>,
    window_days: u32,
}

impl AggregationService {
    pub fn new(reader: Arc<dyn AggregationReader>) -> Self {
        Self {
            reader,
            clock: Arc::new(SystemClock),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    /// Start date used when a query does not give one
    pub fn default_start(&self) -> NaiveDate {
        (self.clock.now() - Duration::days(i64::from(self.window_days))).date_naive()
    }

    /// Aggregate trades of `ticker` dated on or after `start`.
    ///
    /// The ticker is trimmed; a blank ticker is rejected before storage is
    /// touched. When no trade matches, the storage `NotFound` error is returned
    /// inside [`TradeError::Aggregation`].
    #[instrument(skip(self))]
    pub async fn get_aggregated_data(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
    ) -> Result<AggregatedData, TradeError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(TradeError::validation("ticker", "ticker is required"));
        }

        let start = start.unwrap_or_else(|| self.default_start());
        let (max_range_value, max_daily_volume) = self
            .reader
            .aggregated(ticker, start)
            .await
            .map_err(TradeError::Aggregation)?;

        debug!(%start, %max_range_value, max_daily_volume, "Aggregated data fetched");

        Ok(AggregatedData {
            ticker: ticker.to_string(),
            max_range_value,
            max_daily_volume,
        })
    }
}
