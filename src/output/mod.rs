//! Output module for reporting harvest results
//!
//! This module handles:
//! - Statistics over an existing dataset snapshot
//! - The end-of-session walk summary

pub mod stats;

pub use stats::{dataset_statistics, print_statistics, DatasetStatistics};

use crate::crawler::WalkSummary;

/// Prints the counters of a finished session
pub fn print_walk_summary(summary: &WalkSummary) {
    println!("=== Harvest Summary ===\n");

    if let Some(reason) = summary.stop_reason {
        println!("Stopped: {}", reason);
    }
    println!("Index pages: {} ({} failed)", summary.index_pages, summary.index_failures);
    println!(
        "Items: {} tried, {} accepted, {} rejected, {} failed",
        summary.items_attempted, summary.accepted, summary.rejected, summary.item_failures
    );
    println!("Bot walls cleared: {}", summary.bot_walls);
    println!(
        "Snapshots: {} written, {} failed",
        summary.flushes, summary.flush_failures
    );
    println!("Records in dataset: {}", summary.records_total);
}
