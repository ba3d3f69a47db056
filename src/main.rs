//! Listing-Harvester main entry point
//!
//! This is the command-line interface for the Listing-Harvester crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use listing_harvester::config::{load_config_with_hash, Config};
use listing_harvester::crawler::run_harvest;
use listing_harvester::estimate::{estimate, Query};
use listing_harvester::inference::{NeighborModel, PredictionService};
use listing_harvester::output::{dataset_statistics, print_statistics, print_walk_summary};
use listing_harvester::storage::{open_snapshot, SnapshotStore};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Listing-Harvester: a resumable classifieds crawler
///
/// Walks the paginated index of a used-car listing site, extracts each
/// listing into a fixed-column CSV dataset and resumes where the last
/// session stopped.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A resumable used-car listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true, default_value = "harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the index and extend the dataset
    Crawl {
        /// Start from an empty dataset, ignoring the existing snapshot
        #[arg(long)]
        fresh: bool,
    },

    /// Validate config and show what a crawl would start from
    DryRun,

    /// Show statistics of the dataset snapshot
    Stats,

    /// Estimate a price from similar listings in the dataset
    Estimate {
        #[arg(long)]
        brand: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        transmission: Option<String>,

        /// Age in years
        #[arg(long)]
        age: u32,

        /// Mileage in km
        #[arg(long)]
        mileage: u64,

        /// Power in kW
        #[arg(long)]
        power: u64,
    },

    /// Answer a JSON prediction request (file or stdin)
    Predict {
        /// Request file; stdin when omitted
        #[arg(value_name = "REQUEST")]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Crawl { fresh } => handle_crawl(&config, fresh).await,
        Command::DryRun => handle_dry_run(&config),
        Command::Stats => handle_stats(&config),
        Command::Estimate {
            brand,
            model,
            transmission,
            age,
            mileage,
            power,
        } => handle_estimate(
            &config,
            Query {
                brand,
                model,
                transmission,
                age_years: f64::from(age),
                mileage_km: mileage as f64,
                power_kw: power as f64,
            },
        ),
        Command::Predict { input } => handle_predict(&config, input),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Validates config and shows where a crawl would start
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Listing-Harvester Dry Run ===\n");

    println!("Index Walk:");
    println!("  First index page: {}", config.crawler.index_url(config.crawler.start_page));
    println!("  Item path pattern: {}", config.crawler.item_path_pattern);
    println!("  Target records: {}", config.crawler.target_records);
    match config.crawler.max_pages {
        Some(max) => println!("  Last index page: {}", max),
        None => println!("  Last index page: unbounded"),
    }

    println!("\nPacing:");
    println!(
        "  Delay between items: {}-{}ms",
        config.pacing.min_delay_ms, config.pacing.max_delay_ms
    );
    println!(
        "  Timeouts: index {}s, item {}s",
        config.fetch.index_timeout_secs, config.fetch.item_timeout_secs
    );

    println!("\nValidation:");
    println!("  Minimum price: {} EUR", config.validation.min_price);
    println!("  Labels ({}):", config.labels.len());
    for entry in &config.labels {
        println!("    - {} -> {}", entry.label, entry.field);
    }

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.csv_path);
    println!("  Autosave every: {} records", config.output.autosave_every);
    if let Some(database) = &config.output.export_database {
        println!("  SQLite export: {}", database);
    }

    let state = open_snapshot(config)
        .load()
        .with_context(|| format!("Failed to read snapshot {}", config.output.csv_path))?;

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would resume with {} records and {} seen URLs",
        state.record_count(),
        state.seen_count()
    );
    if state.record_count() >= config.crawler.target_records {
        println!("✓ Target already reached; a crawl would only rewrite outputs");
    }

    Ok(())
}

/// Shows statistics from the snapshot
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Dataset: {}\n", config.output.csv_path);

    let state = open_snapshot(config)
        .load()
        .with_context(|| format!("Failed to read snapshot {}", config.output.csv_path))?;

    print_statistics(&dataset_statistics(&state));

    Ok(())
}

fn handle_estimate(config: &Config, query: Query) -> anyhow::Result<()> {
    let state = open_snapshot(config)
        .load()
        .with_context(|| format!("Failed to read snapshot {}", config.output.csv_path))?;

    let Some(result) = estimate(state.records(), &query, &config.estimator) else {
        bail!("Dataset {} is empty, nothing to estimate from", config.output.csv_path);
    };

    println!("Estimated price: {:.0} EUR", result.price);
    println!("Range: {:.0} - {:.0} EUR", result.low, result.high);
    println!("Based on {} similar listings ({})", result.neighbours, result.tier);

    Ok(())
}

fn handle_predict(config: &Config, input: Option<PathBuf>) -> anyhow::Result<()> {
    let raw = match &input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read request from stdin")?;
            raw
        }
    };

    let service = match NeighborModel::from_dataset(
        std::path::Path::new(&config.output.csv_path),
        config.estimator.clone(),
    ) {
        Ok(model) => PredictionService::new(Box::new(model)),
        Err(e) => {
            tracing::warn!("{}", e);
            PredictionService::unavailable()
        }
    };

    match service.handle(&raw) {
        Ok(predictions) => {
            println!("{}", serde_json::to_string(&predictions)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            bail!(e)
        }
    }
}

/// Runs a crawl session
async fn handle_crawl(config: &Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous snapshot)");
    } else {
        tracing::info!("Starting crawl (will resume from {} if present)", config.output.csv_path);
    }

    tracing::info!(
        "Target: {} records, autosave every {}",
        config.crawler.target_records,
        config.output.autosave_every
    );

    let summary = run_harvest(config, fresh).await.context("Crawl failed")?;
    print_walk_summary(&summary);

    Ok(())
}
