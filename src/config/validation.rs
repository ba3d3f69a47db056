use crate::config::types::{
    BotWallConfig, Config, CrawlerConfig, EstimatorConfig, LabelEntry, OutputConfig,
    PacingConfig, ValidationConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_pacing_config(&config.pacing)?;
    validate_validation_config(&config.validation)?;
    validate_output_config(&config.output)?;
    validate_bot_wall_config(&config.bot_wall)?;
    validate_labels(&config.labels)?;
    validate_estimator_config(&config.estimator)?;
    Ok(())
}

/// Validates the index walk configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.start_url.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "start_url must contain a {{page}} placeholder, got '{}'",
            config.start_url
        )));
    }

    let rendered = config.index_url(config.start_page);
    let url = Url::parse(&rendered)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", rendered, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.target_records < 1 {
        return Err(ConfigError::Validation(
            "target_records must be >= 1, got 0".to_string(),
        ));
    }

    Regex::new(&config.item_path_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!(
            "item_path_pattern '{}': {}",
            config.item_path_pattern, e
        ))
    })?;

    if let Some(max_pages) = config.max_pages {
        if max_pages < config.start_page {
            return Err(ConfigError::Validation(format!(
                "max_pages ({}) must not be below start_page ({})",
                max_pages, config.start_page
            )));
        }
    }

    Ok(())
}

/// Validates the delay band
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }
    Ok(())
}

fn validate_validation_config(config: &ValidationConfig) -> Result<(), ConfigError> {
    if config.min_price < 1 {
        return Err(ConfigError::Validation(
            "min_price must be >= 1, got 0".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    if config.autosave_every < 1 {
        return Err(ConfigError::Validation(
            "autosave_every must be >= 1, got 0".to_string(),
        ));
    }

    if matches!(config.export_database.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "export_database cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_bot_wall_config(config: &BotWallConfig) -> Result<(), ConfigError> {
    if config.url_markers.is_empty() && config.text_markers.is_empty() {
        return Err(ConfigError::Validation(
            "bot-wall needs at least one url or text marker".to_string(),
        ));
    }

    if config
        .url_markers
        .iter()
        .chain(config.text_markers.iter())
        .any(|marker| marker.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "bot-wall markers cannot be blank".to_string(),
        ));
    }

    Ok(())
}

/// Validates the label table
fn validate_labels(labels: &[LabelEntry]) -> Result<(), ConfigError> {
    if labels.is_empty() {
        return Err(ConfigError::Validation(
            "label table cannot be empty".to_string(),
        ));
    }

    for (i, entry) in labels.iter().enumerate() {
        if entry.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "label #{} for field '{}' is blank",
                i + 1,
                entry.field
            )));
        }

        if labels[..i]
            .iter()
            .any(|other| other.label.trim().eq_ignore_ascii_case(entry.label.trim()))
        {
            return Err(ConfigError::Validation(format!(
                "label '{}' is listed more than once",
                entry.label
            )));
        }
    }

    Ok(())
}

fn validate_estimator_config(config: &EstimatorConfig) -> Result<(), ConfigError> {
    if config.neighbours < 1 {
        return Err(ConfigError::Validation(
            "estimator neighbours must be >= 1, got 0".to_string(),
        ));
    }

    if config.narrow_spread < 0.0 || config.wide_spread < 0.0 {
        return Err(ConfigError::Validation(
            "estimator spreads cannot be negative".to_string(),
        ));
    }

    Ok(())
}
