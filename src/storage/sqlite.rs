//! SQLite export of the dataset
//!
//! The export is a second, queryable copy of the finished dataset. It is
//! rewritten as a whole at the end of each session; the CSV snapshot stays
//! the resume source.

use crate::listing::Listing;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::StorageResult;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite export target
pub struct SqliteExport {
    conn: Connection,
}

impl SqliteExport {
    /// Opens or creates the export database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Replaces the exported dataset with `records`
    ///
    /// Runs in one transaction. Duplicate URLs keep their first row.
    ///
    /// # Returns
    ///
    /// The number of rows in the table afterwards
    pub fn replace_listings(&mut self, records: &[Listing]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM listings", [])?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO listings
                 (url, price_market, age, mileage, brand, model, power_kw, transmission, title, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for (position, listing) in records.iter().enumerate() {
                stmt.execute(params![
                    listing.source_url,
                    to_sql_int(listing.price),
                    listing.age_years,
                    to_sql_int(listing.mileage_km),
                    listing.brand,
                    listing.model,
                    to_sql_int(listing.power_kw),
                    listing.transmission,
                    listing.title,
                    position as i64,
                ])?;
            }
        }

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        tx.execute(
            "INSERT INTO exports (exported_at, row_count) VALUES (?1, ?2)",
            params![Utc::now().to_rfc3339(), count],
        )?;
        tx.commit()?;

        Ok(count as usize)
    }

    pub fn count_listings(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Loads the exported rows in acceptance order
    pub fn load_listings(&self) -> StorageResult<Vec<Listing>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, price_market, age, mileage, brand, model, power_kw, transmission, title
             FROM listings ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Listing {
                source_url: row.get(0)?,
                price: from_sql_int(row.get(1)?),
                age_years: row.get(2)?,
                mileage_km: from_sql_int(row.get(3)?),
                brand: row.get(4)?,
                model: row.get(5)?,
                power_kw: from_sql_int(row.get(6)?),
                transmission: row.get(7)?,
                title: row.get(8)?,
            })
        })?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    pub fn export_count(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM exports", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// SQLite integers are signed 64-bit
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
