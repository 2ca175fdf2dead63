//! Loading of (target URL, CSS selector) pairs from CSV files
//!
//! Every `*.csv` file in the input directory holds rows of
//! `url,css_selector`, with an optional header row.

mod loader;

pub use loader::{find_csv_files, load_all_valid_urls, load_csv_file, validate_url, TargetPair};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading input files
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input directory not found or not a directory: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
