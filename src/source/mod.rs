//! # Streaming Source
//!
//! A [`SourceReader`] turns a filesystem path into a [`SourceStream`]: a bounded
//! channel of decoded [`RowTable`]s plus a separate channel of [`SourceError`]s.
//! Both channels close when the scan ends, fails, or is cancelled.
//!
//! The producer reserves the data channel's single slot before opening a file,
//! so it never decodes a file while the previous table is still unclaimed.
//! Consumers pull both channels through [`SourceStream::next_event`].

pub mod csv_reader;

pub use csv_reader::{decode_file, CsvSourceReader, ReaderOptions};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Rows decoded from one file, header included, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTable {
    pub path: PathBuf,
    pub rows: Vec<Vec<String>>,
}

impl RowTable {
    pub fn new(path: impl Into<PathBuf>, rows: Vec<Vec<String>>) -> Self {
        Self {
            path: path.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split off the header row, returning it and the data rows that follow
    pub fn split_header(&self) -> (Option<&[String]>, &[Vec<String>]) {
        match self.rows.split_first() {
            Some((header, data)) => (Some(header.as_slice()), data),
            None => (None, &[]),
        }
    }
}

/// File-level failures while scanning; each one halts the scan
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("access path error {}: {source}", path.display())]
    PathAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("list files in path error {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("open file error {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file csv read error {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("file {} line {line}: expected {expected} columns, found {found}", path.display())]
    ColumnCount {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("source scan task failed: {0}")]
    Worker(String),
}

impl SourceError {
    /// The file or directory the failure is about, when there is one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathAccess { path, .. }
            | Self::Walk { path, .. }
            | Self::Open { path, .. }
            | Self::Decode { path, .. }
            | Self::ColumnCount { path, .. } => Some(path),
            Self::Worker(_) => None,
        }
    }
}

/// One item pulled from a running scan
#[derive(Debug)]
pub enum SourceEvent {
    Table(RowTable),
    Failed(SourceError),
}

/// Consumer side of a running scan
pub struct SourceStream {
    tables: mpsc::Receiver<RowTable>,
    errors: mpsc::Receiver<SourceError>,
    tables_open: bool,
    errors_open: bool,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl SourceStream {
    pub fn new(
        tables: mpsc::Receiver<RowTable>,
        errors: mpsc::Receiver<SourceError>,
        cancel: CancellationToken,
        worker: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            tables,
            errors,
            tables_open: true,
            errors_open: true,
            cancel,
            worker,
        }
    }

    /// Next table or scan error, or `None` once both channels have closed or the
    /// token is cancelled. Tables win over errors when both are ready, and a
    /// pending error is still delivered after the table channel closes.
    pub async fn next_event(&mut self) -> Option<SourceEvent> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                table = self.tables.recv(), if self.tables_open => match table {
                    Some(table) => return Some(SourceEvent::Table(table)),
                    None => self.tables_open = false,
                },
                err = self.errors.recv(), if self.errors_open => match err {
                    Some(err) => return Some(SourceEvent::Failed(err)),
                    None => self.errors_open = false,
                },
                else => return None,
            }
        }
    }

    /// Wait for the scan task to exit. Call after both channels have closed;
    /// a panic in the scan task is reported as [`SourceError::Worker`].
    pub async fn finish(mut self) -> Result<(), SourceError> {
        match self.worker.take() {
            Some(worker) => worker
                .await
                .map_err(|err| SourceError::Worker(err.to_string())),
            None => Ok(()),
        }
    }
}

/// Starts a scan of `path` and returns its streams. Must be called from within a
/// Tokio runtime.
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path, cancel: CancellationToken) -> SourceStream;
}
