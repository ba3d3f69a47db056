//! CSV snapshot of the dataset
//!
//! The snapshot is the crawler's output file and its resume input at the
//! same time. Flushes write a sibling temp file and rename it over the
//! snapshot, so the file on disk is always complete.

use crate::listing::{Listing, Validator, COLUMNS};
use crate::state::CrawlState;
use crate::storage::traits::{SnapshotStore, StorageError, StorageResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// CSV file snapshot store
#[derive(Debug, Clone)]
pub struct CsvSnapshot {
    path: PathBuf,
    validator: Validator,
}

impl CsvSnapshot {
    /// Snapshot at `path` that loads rows without a price floor
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            validator: Validator::for_today(0),
        }
    }

    /// Drops loaded rows priced below `min_price`
    pub fn with_min_price(mut self, min_price: u64) -> Self {
        self.validator = Validator::for_today(min_price);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl SnapshotStore for CsvSnapshot {
    fn load(&self) -> StorageResult<CrawlState> {
        if !self.path.exists() {
            return Ok(CrawlState::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();

        if headers.is_empty() {
            return Ok(CrawlState::new());
        }

        let url_index = headers
            .iter()
            .position(|h| h.trim() == "url")
            .ok_or_else(|| StorageError::MissingColumn {
                path: self.location(),
                column: "url",
            })?;

        let mut seen = Vec::new();
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (row, result) in reader.records().enumerate() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Unreadable snapshot row {}: {}", row + 2, e);
                    skipped += 1;
                    continue;
                }
            };

            if let Some(url) = record.get(url_index).map(str::trim).filter(|u| !u.is_empty()) {
                seen.push(url.to_string());
            }

            let listing = match record.deserialize::<Listing>(Some(&headers)) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::debug!("Skipping snapshot row {}: {}", row + 2, e);
                    skipped += 1;
                    continue;
                }
            };

            match self.validator.check(&listing) {
                Ok(()) => records.push(listing),
                Err(rejection) => {
                    tracing::debug!("Dropping snapshot row {}: {}", row + 2, rejection);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} incomplete rows in {} (their URLs stay seen)",
                skipped,
                self.location()
            );
        }

        Ok(CrawlState::from_snapshot(seen, records))
    }

    fn flush(&self, records: &[Listing]) -> StorageResult<usize> {
        let mut temp = NamedTempFile::new_in(self.parent_dir())?;

        let written = {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(temp.as_file_mut());
            writer.write_record(COLUMNS)?;

            let mut urls = HashSet::with_capacity(records.len());
            let mut written = 0usize;
            for listing in records {
                if urls.insert(listing.source_url.as_str()) {
                    writer.serialize(listing)?;
                    written += 1;
                }
            }
            writer.flush()?;
            written
        };

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;

        Ok(written)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing(url: &str, price: u64) -> Listing {
        Listing {
            price,
            age_years: 6,
            mileage_km: 98000,
            brand: "Škoda".to_string(),
            model: "Octavia".to_string(),
            power_kw: 85,
            transmission: "Automatski".to_string(),
            source_url: url.to_string(),
            title: "Škoda Octavia, 2.0 TDI, \"Style\"".to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CsvSnapshot::new(dir.path().join("cars.csv"));

        let state = store.load().unwrap();
        assert_eq!(state.record_count(), 0);
        assert_eq!(state.seen_count(), 0);
    }

    #[test]
    fn test_flush_writes_fixed_header_and_dedups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cars.csv");
        let store = CsvSnapshot::new(&path);

        let written = store
            .flush(&[listing("a", 1000), listing("b", 2000), listing("a", 3000)])
            .unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("Price_market,Age,Mileage,Brand,Model,Power_kW,Transmission,url,title")
        );
        assert!(lines.next().unwrap().starts_with("1000,6,98000,Škoda,Octavia,85,"));
        assert!(lines.next().unwrap().starts_with("2000,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_flush_of_empty_dataset_still_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cars.csv");
        CsvSnapshot::new(&path).flush(&[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_flush_then_load_restores_state() {
        let dir = TempDir::new().unwrap();
        let store = CsvSnapshot::new(dir.path().join("cars.csv"));
        let records = vec![listing("https://x.hr/auti/1", 4500), listing("https://x.hr/auti/2", 7000)];

        store.flush(&records).unwrap();
        let state = store.load().unwrap();

        assert_eq!(state.records(), records.as_slice());
        assert!(state.is_seen("https://x.hr/auti/2"));
    }

    #[test]
    fn test_flush_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = CsvSnapshot::new(dir.path().join("cars.csv"));

        store.flush(&[listing("a", 1000), listing("b", 1000)]).unwrap();
        store.flush(&[listing("c", 1000)]).unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.record_count(), 1);
        assert!(!state.is_seen("a"));

        // no temp files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_load_keeps_urls_of_incomplete_rows_seen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cars.csv");
        std::fs::write(
            &path,
            "Price_market,Age,Mileage,Brand,Model,Power_kW,Transmission,url,title\n\
             9000,4,50000,Kia,Ceed,74,Manual,https://x.hr/auti/1,Kia\n\
             ,4,50000,Kia,Ceed,74,Manual,https://x.hr/auti/2,no price\n\
             9500,5,60000,Kia,Ceed,74,Manual,https://x.hr/auti/1,dup\n",
        )
        .unwrap();

        let state = CsvSnapshot::new(&path).load().unwrap();

        assert_eq!(state.record_count(), 1);
        assert_eq!(state.records()[0].title, "Kia");
        assert!(state.is_seen("https://x.hr/auti/2"));
    }

    #[test]
    fn test_load_drops_rows_that_fail_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cars.csv");
        std::fs::write(
            &path,
            "Price_market,Age,Mileage,Brand,Model,Power_kW,Transmission,url,title\n\
             100,4,50000,,,0,,https://x.hr/auti/1,t\n\
             300,4,50000,Kia,Ceed,74,Manual,https://x.hr/auti/2,cheap\n\
             9000,4,50000,Kia,Ceed,74,Manual,https://x.hr/auti/3,ok\n",
        )
        .unwrap();
        let store = CsvSnapshot::new(&path).with_min_price(500);

        let state = store.load().unwrap();
        assert_eq!(state.record_count(), 1);
        assert_eq!(state.records()[0].title, "ok");
        assert!(state.is_seen("https://x.hr/auti/1"));
        assert!(state.is_seen("https://x.hr/auti/2"));

        store.flush(state.records()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("https://x.hr/auti/1"));
    }

    #[test]
    fn test_load_without_floor_still_requires_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cars.csv");
        std::fs::write(
            &path,
            "Price_market,Age,Mileage,Brand,Model,Power_kW,Transmission,url,title\n\
             100,4,50000,,,0,,https://x.hr/auti/1,t\n\
             300,4,50000,Kia,Ceed,74,Manual,https://x.hr/auti/2,cheap\n",
        )
        .unwrap();

        let state = CsvSnapshot::new(&path).load().unwrap();
        assert_eq!(state.record_count(), 1);
        assert_eq!(state.records()[0].price, 300);
    }

    #[test]
    fn test_load_without_url_column_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cars.csv");
        std::fs::write(&path, "Price_market,Age\n1000,3\n").unwrap();

        let result = CsvSnapshot::new(&path).load();
        assert!(matches!(result, Err(StorageError::MissingColumn { .. })));
    }
}
