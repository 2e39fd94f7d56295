use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Mutex;

use trade_ingestor::storage::{AggregationReader, StorageError, TradeWriter};
use trade_ingestor::Trade;

/// Records every written batch and answers the aggregation query from memory
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    batches: Mutex<Vec<Vec<Trade>>>,
    fail_on_batch: Option<usize>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `batch`-th call to `save_batch` (1-based) with a copy error
    pub fn failing_on_batch(batch: usize) -> Self {
        Self {
            fail_on_batch: Some(batch),
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<Trade>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.batches().into_iter().flatten().collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl TradeWriter for InMemoryTradeStore {
    async fn save_batch(&self, trades: Vec<Trade>) -> Result<u64, StorageError> {
        if trades.is_empty() {
            return Ok(0);
        }
        let mut batches = self.batches.lock().unwrap();
        if self.fail_on_batch == Some(batches.len() + 1) {
            return Err(StorageError::Copy(sqlx::Error::PoolClosed));
        }
        let rows = trades.len() as u64;
        batches.push(trades);
        Ok(rows)
    }
}

#[async_trait]
impl AggregationReader for InMemoryTradeStore {
    async fn aggregated(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<(Decimal, i64), StorageError> {
        let trades = self.trades();
        let matching: Vec<_> = trades
            .iter()
            .filter(|t| t.instrument_code == ticker && t.trade_date >= start)
            .collect();

        let max_price = matching.iter().map(|t| t.price).max();
        let mut daily: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for trade in &matching {
            *daily.entry(trade.trade_date).or_default() += trade.quantity;
        }
        let max_volume = daily.into_values().max();

        match (max_price, max_volume) {
            (Some(price), Some(volume)) => Ok((price, volume)),
            _ => Err(StorageError::not_found(ticker, start)),
        }
    }
}
