//! # Trade Ingestor Configuration
//!
//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `TRADE_INGESTOR__SECTION__KEY` environment variables, then the flat
//! `DATABASE_URL` / `FILE_PATH` / `LOG_LEVEL` variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trade_ingestor::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().ingestion.batch_size;
//! let options = manager.config().reader.options()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::batching::DEFAULT_BATCH_SIZE;
use crate::source::ReaderOptions;

/// Root configuration structure mirroring config/trade-ingestor.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestorConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Input file discovery and decoding
    pub reader: ReaderConfig,

    /// Ingestion run settings
    pub ingestion: IngestionConfig,

    /// Aggregation query settings
    pub aggregation: AggregationConfig,

    /// Log level and output format
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/trade_ingestor_development".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            idle_timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// File or directory to ingest when none is given on the command line
    pub path: Option<PathBuf>,
    /// Field delimiter, a single ASCII character
    pub delimiter: String,
    /// Exact column count every row must have, when set
    pub expected_columns: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: ";".to_string(),
            expected_columns: None,
        }
    }
}

impl ReaderConfig {
    pub fn delimiter_byte(&self) -> ConfigResult<u8> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ConfigurationError::invalid_value(
                "reader.delimiter",
                self.delimiter.clone(),
                "delimiter must be a single ASCII character",
            )),
        }
    }

    pub fn options(&self) -> ConfigResult<ReaderOptions> {
        Ok(ReaderOptions {
            delimiter: self.delimiter_byte()?,
            expected_columns: self.expected_columns,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub batch_size: usize,
    /// Whole-run deadline; the run is cancelled once it elapses
    pub timeout_seconds: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_seconds: 1800,
        }
    }
}

impl IngestionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Window length used when a query gives no start date
    pub window_days: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { window_days: 7 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `trade_ingestor=debug`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LoggingConfig {
    pub fn log_format(&self) -> ConfigResult<LogFormat> {
        match self.format.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigurationError::invalid_value(
                "logging.format",
                other,
                "expected 'pretty' or 'json'",
            )),
        }
    }
}

impl IngestorConfig {
    /// Reject configurations that would fail later at runtime
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database.url",
                "database configuration",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigurationError::invalid_value(
                "database.min_connections",
                self.database.min_connections.to_string(),
                "must not exceed database.max_connections",
            ));
        }

        self.reader.delimiter_byte()?;

        if self.reader.expected_columns == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "reader.expected_columns",
                "0",
                "expected column count must be greater than 0",
            ));
        }

        if self.ingestion.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "ingestion.batch_size",
                "0",
                "batch size must be greater than 0",
            ));
        }

        if self.aggregation.window_days == 0 {
            return Err(ConfigurationError::invalid_value(
                "aggregation.window_days",
                "0",
                "window must be at least one day",
            ));
        }

        self.logging.log_format()?;

        Ok(())
    }
}
