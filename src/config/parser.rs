use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads a TOML file into a validated [`Config`]
///
/// A missing key or section keeps its default, so an empty file is a valid
/// configuration. Read, TOML and range errors all surface as [`ConfigError`].
///
/// ```no_run
/// use nav_mapper::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("nav-mapper.toml")).unwrap();
/// assert!(config.crawler.backoff_factor >= 1.0);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Same as [`load_config`] for text already in memory
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex SHA-256 digest of a configuration file
///
/// Printed at startup so a dead-letter entry can be traced back to the
/// settings of the run that wrote it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(digest(&std::fs::read_to_string(path)?))
}

/// Reads the file once and returns the parsed config with its digest
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, digest(&content)))
}

fn digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
