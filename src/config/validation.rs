use crate::config::types::{Config, CrawlerConfig, LoggingConfig, OutputConfig, PoolConfig};
use crate::ConfigError;

/// Largest pool accepted from configuration
const MAX_CONFIGURED_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_pool_config(&config.pool)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates fetch and retry settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    if !(0.0..=1.0).contains(&config.jitter) {
        return Err(ConfigError::Validation(format!(
            "jitter must be between 0.0 and 1.0, got {}",
            config.jitter
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.file_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "file_suffix cannot be empty".to_string(),
        ));
    }

    if config.lock_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "lock_suffix cannot be empty".to_string(),
        ));
    }

    if config.dead_letter_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "dead_letter_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.max_workers > MAX_CONFIGURED_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be at most {}, got {}",
            MAX_CONFIGURED_WORKERS, config.max_workers
        )));
    }
    Ok(())
}

/// A disabled log file needs no further checks
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.log_dir.as_os_str().is_empty() || config.log_file.trim().is_empty() {
        return Err(ConfigError::Validation(
            "log_dir and log_file cannot be empty".to_string(),
        ));
    }

    if config.max_bytes == 0 {
        return Err(ConfigError::Validation(
            "max_bytes must be >= 1".to_string(),
        ));
    }

    Ok(())
}
