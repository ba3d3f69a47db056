//! Storage traits and error types
//!
//! This module defines the trait interface for dataset snapshots and the
//! associated error types.

use crate::listing::Listing;
use crate::state::CrawlState;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Snapshot {path} is missing the '{column}' column")]
    MissingColumn { path: String, column: &'static str },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the dataset between sessions
///
/// `flush` must replace the previous snapshot as a whole: a reader sees
/// either the old or the new file, never a partial one.
pub trait SnapshotStore {
    /// Rebuilds seen URLs and records from the latest snapshot
    ///
    /// Returns an empty state when no snapshot exists yet.
    fn load(&self) -> StorageResult<CrawlState>;

    /// Writes all records, de-duplicated by URL (first wins)
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn flush(&self, records: &[Listing]) -> StorageResult<usize>;

    /// Human-readable location for log lines
    fn location(&self) -> String;
}
