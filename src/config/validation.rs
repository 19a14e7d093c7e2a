use crate::config::types::{
    Config, FetchConfig, OutputConfig, PipelineConfig, QualityConfig, ResumeConfig, SiteConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound on worker concurrency
const MAX_CONCURRENCY: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_quality_config(&config.quality)?;
    validate_output_config(&config.output)?;
    validate_resume_config(&config.resume)?;
    Ok(())
}

/// Validates the site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("start-url", &config.start_url)?;
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("dynamic-base-url", &config.dynamic_base_url)?;

    if !config.target_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "target-prefix must start with '/', got '{}'",
            config.target_prefix
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    validate_timeout("fetch.timeout-ms", config.timeout_ms)?;
    validate_selector("fetch.content-selector", &config.content_selector)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "fetch.user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    validate_concurrency("pipeline.concurrency", config.concurrency)?;
    validate_budgets("pipeline", config.max_retries, config.timeout_max_retries)
}

fn validate_quality_config(config: &QualityConfig) -> Result<(), ConfigError> {
    validate_thresholds(
        "quality",
        config.extract_min_chars,
        config.save_min_chars,
        config.minimal_floor_chars,
    )
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output.output-dir cannot be empty".to_string(),
        ));
    }

    if config.ledger_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output.ledger-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_resume_config(config: &ResumeConfig) -> Result<(), ConfigError> {
    validate_concurrency("resume.concurrency", config.concurrency)?;
    validate_timeout("resume.timeout-ms", config.timeout_ms)?;
    validate_selector("resume.content-selector", &config.content_selector)?;
    validate_budgets("resume", config.max_retries, config.timeout_max_retries)?;
    validate_thresholds(
        "resume",
        config.extract_min_chars,
        config.save_min_chars,
        config.minimal_floor_chars,
    )
}

/// Validates that a configured URL parses and uses HTTP(S)
fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            key, value
        )));
    }

    Ok(())
}

fn validate_concurrency(key: &str, value: u32) -> Result<(), ConfigError> {
    if !(1..=MAX_CONCURRENCY).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            key, MAX_CONCURRENCY, value
        )));
    }
    Ok(())
}

fn validate_timeout(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!("{} must be > 0", key)));
    }
    Ok(())
}

fn validate_selector(key: &str, value: &str) -> Result<(), ConfigError> {
    Selector::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("{} is not a valid selector: {:?}", key, e)))
}

/// A timeout must never shrink an item's budget
fn validate_budgets(section: &str, ordinary: u32, timeout: u32) -> Result<(), ConfigError> {
    if timeout < ordinary {
        return Err(ConfigError::Validation(format!(
            "{section}.timeout-max-retries ({timeout}) must be >= {section}.max-retries ({ordinary})"
        )));
    }
    Ok(())
}

fn validate_thresholds(
    section: &str,
    extract_min: usize,
    save_min: usize,
    floor: usize,
) -> Result<(), ConfigError> {
    if save_min == 0 {
        return Err(ConfigError::Validation(format!(
            "{section}.save-min-chars must be > 0"
        )));
    }

    if floor > save_min {
        return Err(ConfigError::Validation(format!(
            "{section}.minimal-floor-chars ({floor}) must be <= {section}.save-min-chars ({save_min})"
        )));
    }

    if extract_min > save_min {
        return Err(ConfigError::Validation(format!(
            "{section}.extract-min-chars ({extract_min}) must be <= {section}.save-min-chars ({save_min})"
        )));
    }

    Ok(())
}
