use crate::config::types::{Config, DelayRange, ExtractConfig, FetchConfig, StorageConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_extract_config(&config.extract)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates fetch engine configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.default_retries < 1 || config.default_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "default_retries must be between 1 and 5, got {}",
            config.default_retries
        )));
    }

    let delays = &config.delays;
    validate_delay_range("pre_request", &delays.pre_request)?;
    validate_delay_range("timeout", &delays.timeout)?;
    validate_delay_range("connection", &delays.connection)?;
    validate_delay_range("rate_limited", &delays.rate_limited)?;
    validate_delay_range("unexpected", &delays.unexpected)?;

    Ok(())
}

fn validate_delay_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if range.min_ms > range.max_ms {
        return Err(ConfigError::Validation(format!(
            "delay range '{}' has min {}ms greater than max {}ms",
            name, range.min_ms, range.max_ms
        )));
    }
    Ok(())
}

/// Validates extractor caps
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    let limits = [
        ("content_limit", config.content_limit),
        ("link_limit", config.link_limit),
        ("image_limit", config.image_limit),
        ("script_limit", config.script_limit),
        ("stylesheet_limit", config.stylesheet_limit),
    ];

    for (name, value) in limits {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.enabled && config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when storage is enabled".to_string(),
        ));
    }

    Ok(())
}
