//! Configuration module for Listing-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use listing_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Target: {} records", config.crawler.target_records);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_labels, BotWallConfig, Config, CrawlerConfig, EstimatorConfig, FetchConfig,
    LabelEntry, OutputConfig, PacingConfig, ValidationConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
