//! # Structured Logging Module
//!
//! Console logging through `tracing-subscriber`, either human-readable or JSON
//! lines, with the filter taken from `RUST_LOG` when set and from
//! [`LoggingConfig::level`] otherwise.

use std::path::Path;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // validate() already rejected unknown formats; fall back to pretty regardless
        let format = config.log_format().unwrap_or(LogFormat::Pretty);

        let layer = match format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_filter(filter)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter)
                .boxed(),
        };

        // Use try_init to avoid panic if global subscriber already set (tests, embedding)
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            level = %config.level,
            format = ?format,
            pid = std::process::id(),
            "STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Log structured data for a per-file ingestion step
pub fn log_file_operation(operation: &str, path: &Path, records: usize, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        path = %path.display(),
        records = records,
        details = details,
        "FILE_OPERATION"
    );
}

/// Log structured data for a single batch write
pub fn log_batch_operation(path: &Path, batch: usize, total_batches: usize, rows: u64) {
    tracing::debug!(
        path = %path.display(),
        batch = batch,
        total_batches = total_batches,
        rows = rows,
        "BATCH_OPERATION"
    );
}
