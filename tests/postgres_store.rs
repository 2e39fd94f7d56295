//! PostgreSQL-backed store tests. Run with `DATABASE_URL` set and `--ignored`.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{write_trade_file, TradeLine};
use trade_ingestor::config::DatabaseConfig;
use trade_ingestor::database::{DatabaseConnection, DatabaseMigrations};
use trade_ingestor::source::CsvSourceReader;
use trade_ingestor::storage::{AggregationReader, PgTradeStore, StorageError, TradeWriter};
use trade_ingestor::{FixedClock, Trade, TradeService};

async fn setup() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let config = DatabaseConfig {
        url,
        ..DatabaseConfig::default()
    };
    let db = DatabaseConnection::connect(&config)
        .await
        .expect("database should be reachable");
    DatabaseMigrations::run_all(db.pool()).await.unwrap();
    db.pool().clone()
}

/// Tickers unique to one test run so parallel tests never see each other's rows
fn unique_ticker(prefix: &str) -> String {
    format!("{prefix}{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn trade(ticker: &str, price: &str, quantity: i64, day: NaiveDate) -> Trade {
    Trade {
        instrument_code: ticker.to_string(),
        trade_date: day,
        closing_time: "10:00:00".to_string(),
        quantity,
        price: Decimal::from_str(price).unwrap(),
        created_at: None,
    }
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_save_batch_and_aggregate() {
    let pool = setup().await;
    let store = PgTradeStore::new(pool);
    let ticker = unique_ticker("PG");

    let written = store
        .save_batch(vec![
            trade(&ticker, "10.50", 100, date(2024, 8, 14)),
            trade(&ticker, "11.25", 300, date(2024, 8, 14)),
            trade(&ticker, "12.00", 350, date(2024, 8, 15)),
            trade(&ticker, "50.00", 9_000, date(2024, 8, 1)),
        ])
        .await
        .unwrap();
    assert_eq!(written, 4);

    let (max_price, max_volume) = store.aggregated(&ticker, date(2024, 8, 10)).await.unwrap();
    assert_eq!(max_price, Decimal::from_str("12.00").unwrap());
    assert_eq!(max_volume, 400);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_empty_batch_is_a_no_op() {
    let pool = setup().await;
    let store = PgTradeStore::new(pool);

    assert_eq!(store.save_batch(Vec::new()).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_aggregate_without_rows_is_not_found() {
    let pool = setup().await;
    let store = PgTradeStore::new(pool);
    let ticker = unique_ticker("NONE");

    let err = store.aggregated(&ticker, date(2024, 1, 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_created_at_is_stamped_by_store_clock() {
    let pool = setup().await;
    let stamp = Utc.with_ymd_and_hms(2024, 8, 16, 18, 0, 0).unwrap();
    let store = PgTradeStore::new(pool.clone()).with_clock(Arc::new(FixedClock::new(stamp)));
    let ticker = unique_ticker("TS");

    store
        .save_batch(vec![trade(&ticker, "1.00", 1, date(2024, 8, 16))])
        .await
        .unwrap();

    let (created_at, closing_time): (chrono::DateTime<Utc>, String) = sqlx::query_as(
        "SELECT created_at, hora_fechamento FROM trades WHERE codigo_instrumento = $1",
    )
    .bind(&ticker)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(created_at, stamp);
    assert_eq!(closing_time, "10:00:00");
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_ingest_files_end_to_end() {
    let pool = setup().await;
    let ticker = unique_ticker("E2E");
    let dir = TempDir::new().unwrap();
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    write_trade_file(
        dir.path(),
        "trades.txt",
        &[
            TradeLine::new(&ticker).price("20,10").quantity("1,000").trade_date(&today),
            TradeLine::new(&ticker).price("20,40").quantity("500").trade_date(&today),
        ],
    );

    let service = TradeService::new(
        Arc::new(PgTradeStore::new(pool)),
        Arc::new(CsvSourceReader::default()),
    )
    .with_batch_size(1);

    let summary = service
        .ingest_files(dir.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.batches, 2);

    let data = service.get_aggregated_data(&ticker, None).await.unwrap();
    assert_eq!(data.max_range_value, Decimal::from_str("20.40").unwrap());
    assert_eq!(data.max_daily_volume, 1_500);
}
