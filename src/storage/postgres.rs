//! PostgreSQL trade store.
//!
//! Batches are loaded with `COPY ... FROM STDIN (FORMAT csv)` over a single pooled
//! connection per call; the connection goes back to the pool when the call
//! returns, on success or failure.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{AggregationReader, StorageError, TradeWriter};
use crate::clock::{Clock, SystemClock};
use crate::models::Trade;
use crate::parser::TRADE_DATE_FORMAT;

/// Target columns of the bulk load, in payload order
pub const TRADE_COLUMNS: [&str; 6] = [
    "data_negocio",
    "codigo_instrumento",
    "preco_negocio",
    "quantidade_negociada",
    "hora_fechamento",
    "created_at",
];

const COPY_TRADES: &str = "COPY trades (data_negocio, codigo_instrumento, preco_negocio, \
     quantidade_negociada, hora_fechamento, created_at) FROM STDIN WITH (FORMAT csv)";

/// Max price over the window, and the max of the per-day quantity sums.
/// `HAVING` turns "no matching rows" into an empty result instead of a row of NULLs.
const AGGREGATE_TRADES: &str = r#"
    WITH daily AS (
        SELECT data_negocio,
               MAX(preco_negocio) AS max_price,
               SUM(quantidade_negociada) AS volume
        FROM trades
        WHERE codigo_instrumento = $1
          AND data_negocio >= $2
        GROUP BY data_negocio
    )
    SELECT MAX(max_price) AS max_range_value,
           MAX(volume)::BIGINT AS max_daily_volume
    FROM daily
    HAVING COUNT(*) > 0
"#;

#[derive(Debug, Clone)]
pub struct PgTradeStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgTradeStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock used to stamp trades whose `created_at` is unset
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TradeWriter for PgTradeStore {
    #[instrument(skip(self, trades), fields(records = trades.len()))]
    async fn save_batch(&self, trades: Vec<Trade>) -> Result<u64, StorageError> {
        if trades.is_empty() {
            return Ok(0);
        }

        let payload = encode_copy_rows(trades, self.clock.now())?;

        let mut conn = self.pool.acquire().await.map_err(StorageError::Acquire)?;
        let mut copy = conn
            .copy_in_raw(COPY_TRADES)
            .await
            .map_err(StorageError::Copy)?;

        let sent = copy.send(payload).await.map(|_| ());
        if let Err(err) = sent {
            if let Err(abort_err) = copy.abort(err.to_string()).await {
                warn!(error = %abort_err, "failed to abort COPY after send error");
            }
            return Err(StorageError::Copy(err));
        }

        let rows = copy.finish().await.map_err(StorageError::Copy)?;
        debug!(rows, "COPY finished");
        Ok(rows)
    }
}

#[async_trait]
impl AggregationReader for PgTradeStore {
    #[instrument(skip(self))]
    async fn aggregated(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<(Decimal, i64), StorageError> {
        let row: Option<(Option<Decimal>, Option<i64>)> = sqlx::query_as(AGGREGATE_TRADES)
            .bind(ticker)
            .bind(start)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Query)?;

        match row {
            Some((Some(max_range_value), Some(max_daily_volume))) => {
                Ok((max_range_value, max_daily_volume))
            }
            _ => Err(StorageError::not_found(ticker, start)),
        }
    }
}

/// Encode trades as the CSV body of the COPY statement, stamping unset
/// `created_at` values with `now`. Text fields are always quoted so an empty
/// instrument code is loaded as an empty string rather than NULL.
pub fn encode_copy_rows(trades: Vec<Trade>, now: DateTime<Utc>) -> Result<Vec<u8>, StorageError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::NonNumeric)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for mut trade in trades {
        let created_at = trade.stamp_created_at(now);
        writer
            .write_record([
                trade.trade_date.format(TRADE_DATE_FORMAT).to_string(),
                trade.instrument_code,
                trade.price.to_string(),
                trade.quantity.to_string(),
                trade.closing_time,
                created_at.to_rfc3339(),
            ])
            .map_err(|err| StorageError::Encode(err.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|err| StorageError::Encode(err.to_string()))
}
