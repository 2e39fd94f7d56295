use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade represents one executed trade read from an exchange flat file
/// Maps to the `trades` table - one row per record, no deduplication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub instrument_code: String, // codigo_instrumento
    pub trade_date: NaiveDate,   // data_negocio
    pub closing_time: String,    // hora_fechamento, always HH:MM:SS
    pub quantity: i64,           // quantidade_negociada
    pub price: Decimal,          // preco_negocio
    pub created_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Fill `created_at` with `now` unless it is already set, returning the stored value
    pub fn stamp_created_at(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        *self.created_at.get_or_insert(now)
    }
}

/// Windowed aggregate for one ticker, computed per query and never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedData {
    pub ticker: String,
    /// Highest single trade price in the window
    pub max_range_value: Decimal,
    /// Highest per-day sum of traded quantity in the window
    pub max_daily_volume: i64,
}
