//! Nav-Mapper: concurrent site navigation mapper
//!
//! This crate discovers a site's navigation structure by breadth-first crawling
//! of the links inside a CSS-selected container, renders the result as a
//! directory-style tree and commits it to disk with a crash-safe write. Many
//! targets are processed concurrently on a bounded worker pool; permanent
//! failures are recorded in an append-only dead-letter log.

pub mod config;
pub mod crawler;
pub mod input;
pub mod logging;
pub mod output;
pub mod task;
pub mod url;

use thiserror::Error;

/// Main error type for Nav-Mapper operations
#[derive(Debug, Error)]
pub enum NavMapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] input::InputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Nav-Mapper operations
pub type Result<T> = std::result::Result<T, NavMapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{NavigationTree, Navigator};
pub use output::render_tree;
pub use task::{ConcurrencyManager, TaskResult, TaskWorker};
pub use crate::url::{extract_authority, website_name};
