//! Statistics over a dataset snapshot
//!
//! This module summarises an existing dataset for the `stats` command.

use crate::listing::Listing;
use crate::state::CrawlState;
use std::collections::HashMap;

/// Dataset statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStatistics {
    /// Accepted records in the snapshot
    pub records: usize,

    /// URLs in the snapshot, including rows that no longer parse
    pub seen_urls: usize,

    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub price_median: Option<f64>,
    pub mean_age: Option<f64>,
    pub mean_mileage: Option<f64>,

    /// Records per brand, most common first
    pub brands: Vec<(String, usize)>,

    /// Records per transmission, most common first
    pub transmissions: Vec<(String, usize)>,
}

/// Computes statistics from a loaded snapshot
pub fn dataset_statistics(state: &CrawlState) -> DatasetStatistics {
    let records = state.records();

    let mut prices: Vec<u64> = records.iter().map(|r| r.price).collect();
    prices.sort_unstable();

    let price_median = match prices.len() {
        0 => None,
        n if n % 2 == 0 => Some((prices[n / 2 - 1] as f64 + prices[n / 2] as f64) / 2.0),
        n => Some(prices[n / 2] as f64),
    };

    DatasetStatistics {
        records: records.len(),
        seen_urls: state.seen_count(),
        price_min: prices.first().copied(),
        price_max: prices.last().copied(),
        price_median,
        mean_age: mean(records.iter().map(|r| r.age_years as f64)),
        mean_mileage: mean(records.iter().map(|r| r.mileage_km as f64)),
        brands: tally(records, |r| &r.brand),
        transmissions: tally(records, |r| &r.transmission),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn tally(records: &[Listing], key: impl Fn(&Listing) -> &String) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(key(record).as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset Statistics ===\n");

    println!("Overview:");
    println!("  Records: {}", stats.records);
    println!("  URLs seen: {}", stats.seen_urls);
    println!(
        "  Incomplete rows: {}",
        stats.seen_urls.saturating_sub(stats.records)
    );
    println!();

    if stats.records == 0 {
        println!("No records yet.");
        return;
    }

    println!("Price (EUR):");
    if let (Some(min), Some(max)) = (stats.price_min, stats.price_max) {
        println!("  Range: {} - {}", min, max);
    }
    if let Some(median) = stats.price_median {
        println!("  Median: {:.0}", median);
    }
    println!();

    if let (Some(age), Some(mileage)) = (stats.mean_age, stats.mean_mileage) {
        println!("Averages:");
        println!("  Age: {:.1} years", age);
        println!("  Mileage: {:.0} km", mileage);
        println!();
    }

    println!("Top Brands ({} total):", stats.brands.len());
    for (brand, count) in stats.brands.iter().take(10) {
        let percentage = (*count as f64 / stats.records as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", brand, count, percentage);
    }
    println!();

    println!("Transmissions:");
    for (transmission, count) in &stats.transmissions {
        println!("  {}: {}", transmission, count);
    }
}
