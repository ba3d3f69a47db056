//! Storage module for persisting the dataset
//!
//! This module handles everything that touches disk:
//! - The CSV snapshot, which is both the output and the resume source
//! - Atomic replacement of the snapshot on every flush
//! - The optional SQLite export of the finished dataset

mod csv_snapshot;
mod schema;
mod sqlite;
mod traits;

pub use csv_snapshot::CsvSnapshot;
pub use sqlite::SqliteExport;
pub use traits::{SnapshotStore, StorageError, StorageResult};

use crate::config::Config;
use crate::listing::Listing;
use std::path::Path;

/// Opens the configured snapshot, applying the configured price floor on load
pub fn open_snapshot(config: &Config) -> CsvSnapshot {
    CsvSnapshot::new(&config.output.csv_path).with_min_price(config.validation.min_price)
}

/// Writes `records` to a fresh SQLite export
///
/// # Returns
///
/// The number of rows exported
pub fn export_sqlite(path: &Path, records: &[Listing]) -> StorageResult<usize> {
    let mut export = SqliteExport::new(path)?;
    export.replace_listings(records)
}
