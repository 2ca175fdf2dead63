//! Integration tests for Nav-Mapper
//!
//! These tests use wiremock to serve real HTTP and tempfile for output
//! directories, exercising the crawl and the full task pipeline end-to-end.

mod crawl_tests;
mod pipeline_tests;

use nav_mapper::crawler::{HttpFetcher, RetryPolicy};
use std::time::Duration;

/// HTTP fetcher with a short timeout and near-zero backoff
pub fn fast_fetcher(timeout: Duration, retries: u32) -> HttpFetcher {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build test client");
    HttpFetcher::with_client(client, RetryPolicy::new(retries, Duration::from_millis(1)))
}

/// A page whose `<nav id="menu">` holds the given links
pub fn nav_page(links: &[(&str, &str)]) -> String {
    let items: String = links
        .iter()
        .map(|(href, text)| format!(r#"<li><a href="{}">{}</a></li>"#, href, text))
        .collect();
    format!(
        r#"<html><head><title>Test</title></head><body>
        <nav id="menu"><ul>{}</ul></nav>
        <footer><a href="/privacy">Privacy</a></footer>
        </body></html>"#,
        items
    )
}
