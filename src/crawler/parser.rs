//! Navigation link extraction
//!
//! This module finds the links inside the navigation container(s) matched by a
//! CSS selector and resolves them to absolute URLs.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Errors raised while extracting links
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// A link found inside a navigation container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    /// Link text, or the raw href when the anchor has no text
    pub text: String,

    /// Absolute URL the link points to
    pub url: Url,
}

/// Capability that turns raw markup and a selector into navigation links
pub trait LinkExtractor: Send + Sync {
    fn extract(
        &self,
        html: &str,
        page_url: &Url,
        selector: &str,
    ) -> Result<Vec<NavLink>, ExtractError>;
}

/// [`LinkExtractor`] backed by the `scraper` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct CssLinkExtractor;

impl LinkExtractor for CssLinkExtractor {
    fn extract(
        &self,
        html: &str,
        page_url: &Url,
        selector: &str,
    ) -> Result<Vec<NavLink>, ExtractError> {
        extract_nav_links(html, page_url, selector)
    }
}

/// Extracts navigation links from the containers matched by `selector`
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` elements anywhere inside a matched container
///
/// **Exclude:**
/// - Fragment-only hrefs (`#section`)
/// - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - Anything that does not resolve to an http(s) URL
///
/// Links are returned in document order and de-duplicated by absolute URL,
/// keeping the first occurrence.
///
/// # Example
///
/// ```
/// use nav_mapper::crawler::extract_nav_links;
/// use url::Url;
///
/// let html = r#"<nav id="menu"><a href="/about">About</a></nav><a href="/other">Other</a>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_nav_links(html, &base_url, "#menu").unwrap();
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url.as_str(), "https://example.com/about");
/// ```
pub fn extract_nav_links(
    html: &str,
    base_url: &Url,
    selector: &str,
) -> Result<Vec<NavLink>, ExtractError> {
    let container_selector =
        Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })?;
    let anchor_selector =
        Selector::parse("a[href]").map_err(|e| ExtractError::InvalidSelector {
            selector: "a[href]".to_string(),
            message: format!("{:?}", e),
        })?;

    let document = Html::parse_document(html);

    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut containers = 0usize;

    for container in document.select(&container_selector) {
        containers += 1;
        for anchor in container.select(&anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(url) = resolve_link(href, base_url) else {
                continue;
            };
            if seen.insert(url.to_string()) {
                links.push(NavLink {
                    text: link_text(&anchor, href),
                    url,
                });
            }
        }
    }

    if containers == 0 {
        tracing::warn!("CSS selector '{}' not found on {}", selector, base_url);
    } else {
        tracing::debug!(
            "Found {} nav links in {} container(s) on {}",
            links.len(),
            containers,
            base_url
        );
    }

    Ok(links)
}

/// Whitespace-collapsed anchor text, falling back to the href
fn link_text(anchor: &ElementRef<'_>, href: &str) -> String {
    let text = anchor
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        href.trim().to_string()
    } else {
        text
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty and fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => Some(absolute_url),
        _ => None,
    }
}
