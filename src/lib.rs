#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Trade Ingestor
//!
//! Streaming ingestion of exchange trade flat files into PostgreSQL, plus a windowed
//! aggregation query over the ingested trades.
//!
//! ## Architecture
//!
//! ```text
//!  CsvSourceReader (blocking task)          IngestionService (caller task)
//!  walk -> decode -> [mpsc(1)] ----------->  parse -> batch -> COPY per chunk
//!               \--> [errors] ------------>  abort run
//! ```
//!
//! - The reader scans one file at a time and blocks on hand-off, so at most one
//!   file's rows are scanned ahead of the writer.
//! - Parsing is all-or-nothing per file; a bad row rejects the whole file.
//! - Chunks are written strictly in order, one pooled connection per chunk, with no
//!   transaction spanning chunks. Whatever was written before a failure stays written.
//! - A `CancellationToken` is observed at every hand-off and every write.
//!
//! ## Module Organization
//!
//! - [`batching`] - Generic order-preserving chunking
//! - [`parser`] - Row table to [`models::Trade`] conversion
//! - [`source`] - Directory walker and CSV decoder feeding a bounded channel
//! - [`storage`] - Writer/reader capabilities and the PostgreSQL implementation
//! - [`services`] - Ingestion orchestrator and aggregation query
//! - [`database`] - Pool creation, health check, embedded migrations
//! - [`config`] - Layered configuration loading
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use trade_ingestor::config::ConfigManager;
//! use trade_ingestor::database::DatabaseConnection;
//! use trade_ingestor::services::TradeService;
//! use trade_ingestor::source::CsvSourceReader;
//! use trade_ingestor::storage::PgTradeStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//! let db = DatabaseConnection::connect(&config.database).await?;
//!
//! let store = Arc::new(PgTradeStore::new(db.pool().clone()));
//! let source = Arc::new(CsvSourceReader::new(config.reader.options()?));
//! let service = TradeService::new(store, source).with_batch_size(config.ingestion.batch_size);
//!
//! let summary = service
//!     .ingest_files(Path::new("data/"), CancellationToken::new())
//!     .await?;
//! println!("wrote {} rows", summary.rows_written);
//! # Ok(())
//! # }
//! ```

pub mod batching;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod services;
pub mod source;
pub mod storage;

pub use batching::{batch, BatchError, DEFAULT_BATCH_SIZE};
pub use clock::{Clock, FixedClock, SystemClock};
pub use crate::config::{ConfigManager, ConfigurationError, IngestorConfig};
pub use error::{Result, TradeError};
pub use models::{AggregatedData, Trade};
pub use parser::{parse_closing_time, parse_rows, parse_trades, FieldError, ParseError, TradeColumns};
pub use services::{AggregationService, IngestionService, IngestionSummary, TradeService};
pub use source::{CsvSourceReader, ReaderOptions, RowTable, SourceError, SourceEvent, SourceReader, SourceStream};
pub use storage::{AggregationReader, PgTradeStore, StorageError, TradeStore, TradeWriter};
