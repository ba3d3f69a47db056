use crate::extract::FieldKey;
use serde::Deserialize;

/// Main configuration structure for Listing-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    pub output: OutputConfig,
    #[serde(rename = "bot-wall", default)]
    pub bot_wall: BotWallConfig,
    #[serde(rename = "label", default = "default_labels")]
    pub labels: Vec<LabelEntry>,
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

/// Index walk configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Index page URL template; `{page}` is replaced with the page number
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// First index page of every session
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Stop once this many records have been accepted
    #[serde(rename = "target-records")]
    pub target_records: usize,

    /// Regex matched against the lowercased path of item page links
    #[serde(rename = "item-path-pattern")]
    pub item_path_pattern: String,

    /// Last index page to walk, if bounded
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

impl CrawlerConfig {
    /// Renders the index URL for the given page number
    pub fn index_url(&self, page: u32) -> String {
        self.start_url.replace("{page}", &page.to_string())
    }
}

/// Randomized delay band applied before each item fetch (milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2500,
            max_delay_ms: 5000,
        }
    }
}

/// HTTP page source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "index-timeout-secs", default = "default_index_timeout")]
    pub index_timeout_secs: u64,

    #[serde(rename = "item-timeout-secs", default = "default_item_timeout")]
    pub item_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            index_timeout_secs: default_index_timeout(),
            item_timeout_secs: default_item_timeout(),
        }
    }
}

/// Record acceptance rules
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Listings priced below this are rejected
    #[serde(rename = "min-price")]
    pub min_price: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { min_price: 500 }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV dataset snapshot (also read back on resume)
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Flush the snapshot after this many accepted records
    #[serde(rename = "autosave-every", default = "default_autosave_every")]
    pub autosave_every: usize,

    /// SQLite file the finished dataset is exported to
    #[serde(rename = "export-database", default)]
    pub export_database: Option<String>,
}

/// Bot-wall indicators, matched case-insensitively
#[derive(Debug, Clone, Deserialize)]
pub struct BotWallConfig {
    #[serde(rename = "url-markers")]
    pub url_markers: Vec<String>,

    #[serde(rename = "text-markers")]
    pub text_markers: Vec<String>,
}

impl Default for BotWallConfig {
    fn default() -> Self {
        Self {
            url_markers: vec!["captcha".to_string(), "unblock".to_string()],
            text_markers: vec!["captcha".to_string()],
        }
    }
}

/// Maps a localized page label onto an internal field
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEntry {
    pub label: String,
    pub field: FieldKey,
}

/// Nearest-neighbour estimator tuning
#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorConfig {
    pub neighbours: usize,

    #[serde(rename = "narrow-spread")]
    pub narrow_spread: f64,

    #[serde(rename = "wide-spread")]
    pub wide_spread: f64,

    /// Neighbour count from which the narrow band is used
    #[serde(rename = "min-neighbours-for-narrow")]
    pub min_neighbours_for_narrow: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            neighbours: 50,
            narrow_spread: 1000.0,
            wide_spread: 2500.0,
            min_neighbours_for_narrow: 20,
        }
    }
}

fn default_start_page() -> u32 {
    1
}

fn default_autosave_every() -> usize {
    50
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .to_string()
}

fn default_index_timeout() -> u64 {
    90
}

fn default_item_timeout() -> u64 {
    120
}

/// Label table of njuskalo.hr car listings
pub fn default_labels() -> Vec<LabelEntry> {
    [
        ("Marka automobila", FieldKey::Brand),
        ("Model automobila", FieldKey::Model),
        ("Tip automobila", FieldKey::Trim),
        ("Godina proizvodnje", FieldKey::Year),
        ("Prijeđeni kilometri", FieldKey::MileageKm),
        ("Snaga motora", FieldKey::PowerKw),
        ("Mjenjač", FieldKey::Transmission),
    ]
    .into_iter()
    .map(|(label, field)| LabelEntry {
        label: label.to_string(),
        field,
    })
    .collect()
}
