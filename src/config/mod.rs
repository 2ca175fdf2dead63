//! Configuration module for Nav-Mapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All settings have defaults, so a configuration file is optional.
//!
//! # Example
//!
//! ```no_run
//! use nav_mapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("nav-mapper.toml")).unwrap();
//! println!("Maps are written to {}", config.output.output_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, LoggingConfig, OutputConfig, PoolConfig, DEFAULT_USER_AGENT,
    MAX_DEFAULT_WORKERS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
