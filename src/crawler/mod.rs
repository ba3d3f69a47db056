//! Crawler module for walking the listing index
//!
//! This module contains the harvesting logic, including:
//! - Page sources (HTTP with per-kind timeouts)
//! - Item link harvesting from index pages
//! - Randomized pacing between item fetches
//! - Bot-wall detection and the clearance checkpoint
//! - The walker that ties them to the dataset state

mod botwall;
mod fetcher;
mod parser;
mod rate_limit;
mod walker;

pub use botwall::{BotWallDetector, ClearanceGate, ConsoleClearance};
pub use fetcher::{build_http_client, FetchError, HttpSource, Page, PageKind, PageSource};
pub use parser::harvest_item_links;
pub use rate_limit::RateLimiter;
pub use walker::{WalkSummary, Walker};

use crate::config::Config;
use crate::state::CrawlState;
use crate::storage::{export_sqlite, open_snapshot, SnapshotStore};
use crate::HarvestError;
use std::path::Path;

/// Runs a complete harvest session
///
/// This is the main entry point for a crawl. It will:
/// 1. Restore state from the CSV snapshot (unless `fresh`)
/// 2. Build the HTTP page source
/// 3. Walk the index until a stop condition holds
/// 4. Flush the snapshot and write the optional SQLite export
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `fresh` - Ignore an existing snapshot and start from an empty dataset
pub async fn run_harvest(config: &Config, fresh: bool) -> Result<WalkSummary, HarvestError> {
    let source = HttpSource::new(&config.fetch)?;
    harvest_with(config, fresh, Box::new(source), Box::new(ConsoleClearance::new())).await
}

/// Runs a harvest session over the given page source and clearance gate
pub async fn harvest_with(
    config: &Config,
    fresh: bool,
    source: Box<dyn PageSource>,
    gate: Box<dyn ClearanceGate>,
) -> Result<WalkSummary, HarvestError> {
    let store = open_snapshot(config);

    let state = if fresh {
        tracing::info!("Fresh session, ignoring {}", store.location());
        CrawlState::new()
    } else {
        let state = store.load()?;
        tracing::info!(
            "Resumed {} records and {} seen URLs from {}",
            state.record_count(),
            state.seen_count(),
            store.location()
        );
        state
    };

    let mut walker = Walker::new(config, state, source, gate, Box::new(store))?;
    let summary = walker.run().await?;

    if let Some(database) = &config.output.export_database {
        match export_sqlite(Path::new(database), walker.state().records()) {
            Ok(rows) => tracing::info!("Exported {} rows to {}", rows, database),
            Err(e) => tracing::error!("Failed to export to {}: {}", database, e),
        }
    }

    Ok(summary)
}
