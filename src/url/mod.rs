//! URL handling module for Nav-Mapper
//!
//! This module provides host and authority extraction for the same-site
//! restriction, plus the deterministic naming of output files.

mod domain;
mod naming;

// Re-export main functions
pub use domain::{extract_authority, extract_domain};
pub use naming::{output_path_for, website_name, EMPTY_DOMAIN_NAME, INVALID_URL_NAME};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses an absolute http(s) URL with a host
///
/// Input pairs are validated before they reach the crawler, but the traversal
/// still needs a parsed start URL and rejects anything it cannot crawl.
pub fn parse_http_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
