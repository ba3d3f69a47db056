use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that a resumed dataset can be matched to the
/// settings that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldKey;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[crawler]
start-url = "https://cars.example.com/used?region=7&page={page}"
target-records = 100
item-path-pattern = "/auti/"

[output]
csv-path = "./cars.csv"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.crawler.start_page, 1);
        assert_eq!(config.crawler.max_pages, None);
        assert_eq!(config.pacing.min_delay_ms, 2500);
        assert_eq!(config.pacing.max_delay_ms, 5000);
        assert_eq!(config.validation.min_price, 500);
        assert_eq!(config.output.autosave_every, 50);
        assert!(config.output.export_database.is_none());
        assert_eq!(config.bot_wall.url_markers, vec!["captcha", "unblock"]);
        assert_eq!(config.labels.len(), 7);
        assert_eq!(config.estimator.neighbours, 50);
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[crawler]
start-url = "https://cars.example.com/used?page={page}"
start-page = 3
target-records = 20
item-path-pattern = "^/oglas/"
max-pages = 10

[pacing]
min-delay-ms = 0
max-delay-ms = 10

[fetch]
user-agent = "TestAgent/1.0"
index-timeout-secs = 5
item-timeout-secs = 6

[validation]
min-price = 1000

[output]
csv-path = "./out.csv"
autosave-every = 5
export-database = "./out.db"

[bot-wall]
url-markers = ["challenge"]
text-markers = ["are you human"]

[[label]]
label = "Make"
field = "brand"

[[label]]
label = "Mileage"
field = "mileage_km"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.start_page, 3);
        assert_eq!(config.crawler.max_pages, Some(10));
        assert_eq!(config.fetch.user_agent, "TestAgent/1.0");
        assert_eq!(config.validation.min_price, 1000);
        assert_eq!(config.output.export_database.as_deref(), Some("./out.db"));
        assert_eq!(config.bot_wall.text_markers, vec!["are you human"]);
        assert_eq!(config.labels.len(), 2);
        assert_eq!(config.labels[1].field, FieldKey::MileageKm);
    }

    #[test]
    fn test_index_url_substitutes_page() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(
            config.crawler.index_url(4),
            "https://cars.example.com/used?region=7&page=4"
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_field_name_is_a_parse_error() {
        let content = format!("{}\n[[label]]\nlabel = \"Boja\"\nfield = \"colour\"\n", MINIMAL);
        assert!(matches!(parse_config(&content), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = MINIMAL.replace("target-records = 100", "target-records = 0");
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
