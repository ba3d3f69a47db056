//! Nearest-neighbour price estimate over the dataset
//!
//! The candidate pool is relaxed one [`Tier`] at a time until it is
//! non-empty. Candidates are ranked by range-normalised distance on age,
//! mileage and power; the estimate is the median price of the nearest
//! ones.

use crate::config::EstimatorConfig;
use crate::listing::Listing;
use serde::Serialize;
use std::fmt;

const EPSILON: f64 = 1e-9;

/// Vehicle to price
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub brand: String,
    pub model: String,
    pub transmission: Option<String>,
    pub age_years: f64,
    pub mileage_km: f64,
    pub power_kw: f64,
}

/// Candidate pool, narrowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    BrandModelTransmission,
    BrandModel,
    Brand,
    All,
}

impl Tier {
    pub const ORDER: [Tier; 4] = [
        Tier::BrandModelTransmission,
        Tier::BrandModel,
        Tier::Brand,
        Tier::All,
    ];

    fn admits(&self, listing: &Listing, query: &Query) -> bool {
        let brand = || same(&listing.brand, &query.brand);
        let model = || same(&listing.model, &query.model);
        match self {
            Tier::BrandModelTransmission => match &query.transmission {
                Some(t) => brand() && model() && same(&listing.transmission, t),
                None => false,
            },
            Tier::BrandModel => brand() && model(),
            Tier::Brand => brand(),
            Tier::All => true,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::BrandModelTransmission => "brand + model + transmission",
            Tier::BrandModel => "brand + model",
            Tier::Brand => "brand",
            Tier::All => "whole dataset",
        };
        f.write_str(name)
    }
}

/// A price estimate with its band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub price: f64,
    pub low: f64,
    pub high: f64,
    pub neighbours: usize,
    pub tier: Tier,
}

fn same(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Spread of one feature over the whole dataset
struct Ranges {
    age: f64,
    mileage: f64,
    power: f64,
}

impl Ranges {
    fn of(records: &[Listing]) -> Self {
        fn span(values: impl Iterator<Item = f64>) -> f64 {
            let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            (hi - lo).max(0.0) + EPSILON
        }
        Self {
            age: span(records.iter().map(|r| r.age_years as f64)),
            mileage: span(records.iter().map(|r| r.mileage_km as f64)),
            power: span(records.iter().map(|r| r.power_kw as f64)),
        }
    }

    fn distance(&self, listing: &Listing, query: &Query) -> f64 {
        (listing.age_years as f64 - query.age_years).abs() / self.age
            + (listing.mileage_km as f64 - query.mileage_km).abs() / self.mileage
            + (listing.power_kw as f64 - query.power_kw).abs() / self.power
    }
}

/// Estimates a price for `query`; None for an empty dataset
///
/// # Example
///
/// ```
/// use listing_harvester::config::EstimatorConfig;
/// use listing_harvester::estimate::{estimate, Query, Tier};
///
/// let query = Query {
///     brand: "Kia".into(),
///     model: "Ceed".into(),
///     transmission: None,
///     age_years: 5.0,
///     mileage_km: 90_000.0,
///     power_kw: 74.0,
/// };
/// assert!(estimate(&[], &query, &EstimatorConfig::default()).is_none());
/// ```
pub fn estimate(records: &[Listing], query: &Query, config: &EstimatorConfig) -> Option<Estimate> {
    let (tier, pool) = Tier::ORDER.iter().find_map(|tier| {
        let pool: Vec<&Listing> = records.iter().filter(|r| tier.admits(r, query)).collect();
        (!pool.is_empty()).then_some((*tier, pool))
    })?;

    let ranges = Ranges::of(records);
    let mut ranked: Vec<(f64, &Listing)> = pool
        .into_iter()
        .map(|listing| (ranges.distance(listing, query), listing))
        .collect();
    // stable: equal distances keep dataset order
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    ranked.truncate(config.neighbours.max(1));

    let prices: Vec<f64> = ranked.iter().map(|(_, l)| l.price as f64).collect();
    let price = median(prices)?;
    let neighbours = ranked.len();
    let spread = if neighbours >= config.min_neighbours_for_narrow {
        config.narrow_spread
    } else {
        config.wide_spread
    };

    tracing::debug!("Estimated {} from {} neighbours ({})", price, neighbours, tier);

    Some(Estimate {
        price,
        low: price - spread,
        high: price + spread,
        neighbours,
        tier,
    })
}

/// Median; the mean of the two middle values for an even count
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
