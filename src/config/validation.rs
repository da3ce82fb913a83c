use crate::config::types::{CatalogConfig, Config, HttpConfig, ImagesConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;

    if config.storage.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    validate_catalog_config(&config.catalog)?;
    validate_images_config(&config.images)?;
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.listing_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "listing_timeout_secs must be >= 1, got {}",
            config.listing_timeout_secs
        )));
    }

    Ok(())
}

fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    validate_endpoint("listing_url", &config.listing_url)?;
    validate_endpoint("detail_url", &config.detail_url)?;

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "catalog checkpoint_path cannot be empty".to_string(),
        ));
    }

    validate_retry("catalog", &config.retry)
}

fn validate_images_config(config: &ImagesConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "images directory cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "images checkpoint_path cannot be empty".to_string(),
        ));
    }

    validate_retry("images", &config.retry)
}

/// Validates an endpoint URL: must parse and use http(s)
fn validate_endpoint(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

fn validate_retry(section: &str, retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "{} max_attempts must be >= 1, got {}",
            section, retry.max_attempts
        )));
    }

    if retry.initial_delay_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "{} initial_delay_ms must be >= 1, got {}",
            section, retry.initial_delay_ms
        )));
    }

    // Backoff delays must strictly increase
    if !retry.backoff_factor.is_finite() || retry.backoff_factor <= 1.0 {
        return Err(ConfigError::Validation(format!(
            "{} backoff_factor must be a finite number > 1.0, got {}",
            section, retry.backoff_factor
        )));
    }

    Ok(())
}
