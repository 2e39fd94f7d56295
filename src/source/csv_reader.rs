//! Delimited flat-file reader.
//!
//! Scanning runs on a blocking task: it walks the path with `walkdir` in lexical
//! order, decodes each regular file completely with the `csv` crate, and hands the
//! table to the consumer through the runtime handle so the hand-off can race the
//! cancellation token.
//!
//! A file is only opened once the single channel slot is free, i.e. once the
//! consumer has received the previous table. At most one decoded table waits
//! ahead of the consumer, and a failing file is not even read while an earlier
//! table is still unclaimed.

use std::fs::{self, File};
use std::path::Path;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{RowTable, SourceError, SourceReader, SourceStream};

/// How files are decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Single-byte field delimiter
    pub delimiter: u8,
    /// When set, every row of a file must have exactly this many columns
    pub expected_columns: Option<usize>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            expected_columns: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvSourceReader {
    options: ReaderOptions,
}

impl CsvSourceReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }
}

impl SourceReader for CsvSourceReader {
    fn read(&self, path: &Path, cancel: CancellationToken) -> SourceStream {
        let (table_tx, table_rx) = mpsc::channel(1);
        let (error_tx, error_rx) = mpsc::channel(1);

        let scanner = Scanner {
            options: self.options.clone(),
            handle: Handle::current(),
            tables: table_tx,
            errors: error_tx,
            cancel: cancel.clone(),
        };
        let root = path.to_path_buf();

        let worker = tokio::task::spawn_blocking(move || match scanner.scan(&root) {
            Ok(files) => debug!(path = %root.display(), files, "scan finished"),
            Err(ScanStop::Failed(err)) => scanner.report(err),
            Err(ScanStop::Cancelled) => info!(path = %root.display(), "scan cancelled"),
            Err(ScanStop::Closed) => debug!(path = %root.display(), "consumer went away, scan stopped"),
        });

        SourceStream::new(table_rx, error_rx, cancel, Some(worker))
    }
}

/// Why a scan ended early
enum ScanStop {
    Failed(SourceError),
    Cancelled,
    Closed,
}

impl From<SourceError> for ScanStop {
    fn from(err: SourceError) -> Self {
        Self::Failed(err)
    }
}

struct Scanner {
    options: ReaderOptions,
    handle: Handle,
    tables: mpsc::Sender<RowTable>,
    errors: mpsc::Sender<SourceError>,
    cancel: CancellationToken,
}

impl Scanner {
    /// Returns the number of files delivered
    fn scan(&self, root: &Path) -> Result<usize, ScanStop> {
        let metadata = fs::metadata(root).map_err(|source| SourceError::PathAccess {
            path: root.to_path_buf(),
            source,
        })?;

        if !metadata.is_dir() {
            self.scan_file(root)?;
            return Ok(1);
        }

        let mut files = 0;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| SourceError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            self.scan_file(entry.path())?;
            files += 1;
        }
        Ok(files)
    }

    fn scan_file(&self, path: &Path) -> Result<(), ScanStop> {
        if self.cancel.is_cancelled() {
            return Err(ScanStop::Cancelled);
        }

        // Claim the hand-off slot first: the file is not opened until the
        // consumer has taken the previous table
        let permit = self.reserve()?;

        info!(file = %path.display(), "reading new file");
        let table = decode_file(path, &self.options)?;

        debug!(file = %path.display(), rows = table.len(), "sending rows to channel");
        permit.send(table);
        Ok(())
    }

    /// Blocks until the channel slot is free or the token is cancelled
    fn reserve(&self) -> Result<mpsc::Permit<'_, RowTable>, ScanStop> {
        let (tables, cancel) = (&self.tables, &self.cancel);
        self.handle.block_on(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ScanStop::Cancelled),
                permit = tables.reserve() => permit.map_err(|_| ScanStop::Closed),
            }
        })
    }

    fn report(&self, err: SourceError) {
        warn!(error = %err, "scan halted");
        self.handle.block_on(async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {}
                sent = self.errors.send(err) => {
                    if sent.is_err() {
                        debug!("consumer went away before the scan error was delivered");
                    }
                }
            }
        });
    }
}

/// Decode one file into a [`RowTable`]. No row is treated as a header here.
pub fn decode_file(path: &Path, options: &ReaderOptions) -> Result<RowTable, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    // Byte records: a stray non-UTF-8 byte is replaced rather than failing the file
    for record in reader.byte_records() {
        let record = record.map_err(|source| SourceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(expected) = options.expected_columns {
            if record.len() != expected {
                return Err(SourceError::ColumnCount {
                    path: path.to_path_buf(),
                    line: record.position().map_or(0, |pos| pos.line()),
                    expected,
                    found: record.len(),
                });
            }
        }

        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    Ok(RowTable::new(path, rows))
}
