//! # Ingestion Service
//!
//! Drives one ingestion run: a [`SourceReader`] scans the path in the
//! background while this loop parses each delivered table, splits it into
//! chunks and writes the chunks in order. The first failure of any stage ends
//! the run; chunks already written stay written.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::batching::{batch, DEFAULT_BATCH_SIZE};
use crate::clock::{Clock, SystemClock};
use crate::error::TradeError;
use crate::logging::{log_batch_operation, log_file_operation};
use crate::parser::{parse_rows, TradeColumns};
use crate::source::{RowTable, SourceEvent, SourceReader, SourceStream};
use crate::storage::TradeWriter;

/// Line number of the first data row; line 1 is the header
const FIRST_DATA_LINE: usize = 2;

/// Totals for a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub files: usize,
    pub records: usize,
    pub batches: usize,
    pub rows_written: u64,
}

#[derive(Clone)]
pub struct IngestionService {
    source: Arc<dyn SourceReader>,
    writer: Arc<dyn TradeWriter>,
    clock: Arc<dyn Clock>,
    columns: TradeColumns,
    batch_size: usize,
}

impl IngestionService {
    pub fn new(source: Arc<dyn SourceReader>, writer: Arc<dyn TradeWriter>) -> Self {
        Self {
            source,
            writer,
            clock: Arc::new(SystemClock),
            columns: TradeColumns::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Chunk size for bulk writes. Zero is accepted here and rejected per file.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_columns(mut self, columns: TradeColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Ingest every file under `path` (or `path` itself when it is a file).
    ///
    /// Returns [`TradeError::Cancelled`] as soon as `cancel` fires. Rows written
    /// before a failure or cancellation are not rolled back.
    #[instrument(skip(self, cancel), fields(path = %path.display(), batch_size = self.batch_size))]
    pub async fn ingest_files(
        &self,
        path: &Path,
        cancel: CancellationToken,
    ) -> Result<IngestionSummary, TradeError> {
        if cancel.is_cancelled() {
            return Err(TradeError::Cancelled);
        }

        info!("INGESTION: Starting run");

        // Child token: stopping the scan on our own early exit must not cancel the caller
        let scan_cancel = cancel.child_token();
        let mut stream = self.source.read(path, scan_cancel.clone());

        let outcome = self.drive(&mut stream, &cancel).await;
        scan_cancel.cancel();
        let finished = stream.finish().await;

        match (outcome, finished) {
            (Ok(summary), Ok(())) => {
                info!(
                    files = summary.files,
                    records = summary.records,
                    batches = summary.batches,
                    rows_written = summary.rows_written,
                    "INGESTION: Run completed"
                );
                Ok(summary)
            }
            (Ok(_), Err(err)) => {
                warn!(error = %err, "INGESTION: Scan task failed after delivering all files");
                Err(TradeError::Source(err))
            }
            (Err(err), _) => {
                if err.is_cancelled() {
                    warn!("INGESTION: Run cancelled, rows already written are kept");
                } else {
                    warn!(error = %err, "INGESTION: Run aborted");
                }
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        stream: &mut SourceStream,
        cancel: &CancellationToken,
    ) -> Result<IngestionSummary, TradeError> {
        let mut summary = IngestionSummary::default();

        while let Some(event) = stream.next_event().await {
            match event {
                SourceEvent::Table(table) => self.process_table(table, cancel, &mut summary).await?,
                SourceEvent::Failed(err) => return Err(TradeError::Source(err)),
            }
        }

        // The stream also ends on cancellation
        if cancel.is_cancelled() {
            return Err(TradeError::Cancelled);
        }

        Ok(summary)
    }

    async fn process_table(
        &self,
        table: RowTable,
        cancel: &CancellationToken,
        summary: &mut IngestionSummary,
    ) -> Result<(), TradeError> {
        let path = table.path.as_path();
        let (_header, data) = table.split_header();

        let trades = parse_rows(data, FIRST_DATA_LINE, &self.columns, self.clock.as_ref())
            .map_err(|source| TradeError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let records = trades.len();

        let batches = batch(trades, self.batch_size).map_err(|source| TradeError::Batch {
            path: path.to_path_buf(),
            source,
        })?;
        let total_batches = batches.len();
        debug!(path = %path.display(), records, total_batches, "INGESTION: File parsed");

        for (index, chunk) in batches.into_iter().enumerate() {
            let ordinal = index + 1;
            let written = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TradeError::Cancelled),
                result = self.writer.save_batch(chunk) => result.map_err(|source| TradeError::SaveBatch {
                    path: path.to_path_buf(),
                    batch: ordinal,
                    source,
                })?,
            };

            log_batch_operation(path, ordinal, total_batches, written);
            summary.batches += 1;
            summary.rows_written += written;
        }

        summary.files += 1;
        summary.records += records;
        log_file_operation("ingested", path, records, None);
        Ok(())
    }
}
