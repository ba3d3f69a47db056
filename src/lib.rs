//! Listing-Harvester: a resumable classifieds crawler
//!
//! This crate walks the paginated index of a used-car listing site, extracts
//! structured fields from each listing page, validates them into [`Listing`]
//! records and snapshots the dataset incrementally so that an interrupted
//! session resumes without duplicates or losses.

pub mod config;
pub mod crawler;
pub mod estimate;
pub mod extract;
pub mod inference;
pub mod listing;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Listing-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

// Re-export commonly used types
pub use config::Config;
pub use listing::{Listing, Rejection, Validator};
pub use state::CrawlState;
