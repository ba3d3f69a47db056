//! Database schema for the dataset export
//!
//! This module contains the SQL schema of the SQLite file the finished
//! dataset is exported to.

/// SQL schema for the export database
pub const SCHEMA_SQL: &str = r#"
-- One row per accepted listing, same columns as the CSV snapshot
CREATE TABLE IF NOT EXISTS listings (
    url TEXT PRIMARY KEY,
    price_market INTEGER NOT NULL,
    age INTEGER NOT NULL,
    mileage INTEGER NOT NULL,
    brand TEXT NOT NULL,
    model TEXT NOT NULL,
    power_kw INTEGER NOT NULL,
    transmission TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    position INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_brand_model ON listings(brand, model);

-- Track exports
CREATE TABLE IF NOT EXISTS exports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exported_at TEXT NOT NULL,
    row_count INTEGER NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
