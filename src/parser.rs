//! # Trade Record Parser
//!
//! Converts decoded rows into [`Trade`] records using a fixed positional column
//! mapping. Parsing is strict: the first field that fails to convert aborts the
//! whole call, and no partially converted list is ever returned.
//!
//! ## Row layout
//!
//! Columns are bound by position, never by header text:
//!
//! | index | attribute        | format                          |
//! |-------|------------------|---------------------------------|
//! | 1     | instrument code  | free text                       |
//! | 3     | price            | decimal, `,` as separator       |
//! | 4     | quantity         | integer, `,` thousands allowed  |
//! | 5     | closing time     | `HHMMSS...` (first six digits)  |
//! | 8     | trade date       | `YYYY-MM-DD`                    |

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::clock::Clock;
use crate::models::Trade;

pub const TRADE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Positions of the trade attributes within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeColumns {
    pub instrument_code: usize,
    pub price: usize,
    pub quantity: usize,
    pub closing_time: usize,
    pub trade_date: usize,
}

impl TradeColumns {
    /// Layout of the B3 "negócios à vista" flat files
    pub const B3: TradeColumns = TradeColumns {
        instrument_code: 1,
        price: 3,
        quantity: 4,
        closing_time: 5,
        trade_date: 8,
    };

    /// Smallest row width that contains every mapped column
    pub fn min_width(&self) -> usize {
        [
            self.instrument_code,
            self.price,
            self.quantity,
            self.closing_time,
            self.trade_date,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

impl Default for TradeColumns {
    fn default() -> Self {
        Self::B3
    }
}

/// Why a single field could not be converted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("row has {found} columns, expected at least {expected}")]
    MissingColumns { expected: usize, found: usize },

    #[error("invalid date: {0}")]
    TradeDate(#[from] chrono::ParseError),

    #[error("invalid decimal: {0}")]
    Price(#[from] rust_decimal::Error),

    #[error("invalid integer: {0}")]
    Quantity(#[from] std::num::ParseIntError),

    #[error("quantity must not be negative: {0}")]
    NegativeQuantity(i64),

    #[error("expected at least six leading digits (HHMMSS), got {0:?}")]
    ClosingTime(String),
}

impl FieldError {
    /// Column name of the failing attribute in the persisted schema
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingColumns { .. } => "row",
            Self::TradeDate(_) => "data_negocio",
            Self::Price(_) => "preco_negocio",
            Self::Quantity(_) | Self::NegativeQuantity(_) => "quantidade_negociada",
            Self::ClosingTime(_) => "hora_fechamento",
        }
    }
}

/// A row that could not be converted, identified by its 1-based line in the file
#[derive(Error, Debug, Clone, PartialEq)]
#[error("parse error {} at row {row}: {source}", .source.field())]
pub struct ParseError {
    pub row: usize,
    pub value: String,
    #[source]
    pub source: FieldError,
}

/// Parse a whole row table. The first row is the header and is skipped.
pub fn parse_trades(
    table: &[Vec<String>],
    columns: &TradeColumns,
    clock: &dyn Clock,
) -> Result<Vec<Trade>, ParseError> {
    match table.split_first() {
        Some((_header, rows)) => parse_rows(rows, 2, columns, clock),
        None => Ok(Vec::new()),
    }
}

/// Parse header-less data rows. `first_line` is the file line number of `rows[0]`,
/// used only to report where a failure happened.
pub fn parse_rows(
    rows: &[Vec<String>],
    first_line: usize,
    columns: &TradeColumns,
    clock: &dyn Clock,
) -> Result<Vec<Trade>, ParseError> {
    rows.iter()
        .enumerate()
        .map(|(offset, row)| parse_row(first_line + offset, row, columns, clock))
        .collect()
}

fn parse_row(
    line: usize,
    row: &[String],
    columns: &TradeColumns,
    clock: &dyn Clock,
) -> Result<Trade, ParseError> {
    let expected = columns.min_width();
    if row.len() < expected {
        return Err(ParseError {
            row: line,
            value: row.join(";"),
            source: FieldError::MissingColumns {
                expected,
                found: row.len(),
            },
        });
    }

    let field = |index: usize| row[index].as_str();
    let fail = |index: usize| {
        let value = field(index).to_string();
        move |source: FieldError| ParseError {
            row: line,
            value,
            source,
        }
    };

    let trade_date = parse_trade_date(field(columns.trade_date)).map_err(fail(columns.trade_date))?;
    let price = parse_price(field(columns.price)).map_err(fail(columns.price))?;
    let quantity = parse_quantity(field(columns.quantity)).map_err(fail(columns.quantity))?;
    let closing_time =
        parse_closing_time(field(columns.closing_time)).map_err(fail(columns.closing_time))?;

    Ok(Trade {
        instrument_code: field(columns.instrument_code).to_string(),
        trade_date,
        closing_time,
        quantity,
        price,
        created_at: Some(clock.now()),
    })
}

pub fn parse_trade_date(raw: &str) -> Result<NaiveDate, FieldError> {
    Ok(NaiveDate::parse_from_str(raw, TRADE_DATE_FORMAT)?)
}

/// Comma is the decimal separator in the source files
pub fn parse_price(raw: &str) -> Result<Decimal, FieldError> {
    Ok(Decimal::from_str(&raw.replace(',', "."))?)
}

/// Commas are thousands separators and are dropped before conversion.
/// A traded quantity is never negative.
pub fn parse_quantity(raw: &str) -> Result<i64, FieldError> {
    let quantity = raw.replace(',', "").parse::<i64>()?;
    if quantity < 0 {
        return Err(FieldError::NegativeQuantity(quantity));
    }
    Ok(quantity)
}

/// Turn `HHMMSS` (optionally followed by fractional digits) into `HH:MM:SS`
pub fn parse_closing_time(raw: &str) -> Result<String, FieldError> {
    let digits = raw
        .get(..6)
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| FieldError::ClosingTime(raw.to_string()))?;

    Ok(format!("{}:{}:{}", &digits[0..2], &digits[2..4], &digits[4..6]))
}
