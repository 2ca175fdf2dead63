//! Breadth-first navigation crawl
//!
//! Starting from one page, the [`Navigator`] follows the links found inside
//! the selected navigation container(s), staying on the start URL's host (and
//! explicit port, if any). Each URL is attached under the first page that
//! linked to it.

use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::{CssLinkExtractor, ExtractError, LinkExtractor};
use crate::crawler::tree::{NavigationTree, NodeId};
use crate::url::{extract_authority, parse_http_url};
use crate::UrlError;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;
use url::Url;

/// Conditions that abort a whole traversal
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid start URL '{url}': {source}")]
    InvalidStartUrl {
        url: String,
        #[source]
        source: UrlError,
    },

    #[error("Could not fetch start page {url}: {source}")]
    RootFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Crawls one site's navigation into a [`NavigationTree`]
#[derive(Debug, Clone)]
pub struct Navigator<F, E = CssLinkExtractor> {
    fetcher: F,
    extractor: E,
}

impl<F: PageFetcher> Navigator<F> {
    /// Creates a navigator using CSS-based link extraction
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            extractor: CssLinkExtractor,
        }
    }
}

impl<F, E> Navigator<F, E>
where
    F: PageFetcher,
    E: LinkExtractor,
{
    /// Creates a navigator with a custom link extractor
    pub fn with_extractor(fetcher: F, extractor: E) -> Self {
        Self { fetcher, extractor }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Maps the navigation reachable from `start_url`
    ///
    /// # Arguments
    ///
    /// * `start_url` - Absolute http(s) URL of the first page
    /// * `selector` - CSS selector of the navigation container(s)
    ///
    /// # Returns
    ///
    /// * `Ok(NavigationTree)` - Always contains at least the root, even when
    ///   the start page had no content or no links
    /// * `Err(CrawlError)` - The start URL is unusable, its fetch failed
    ///   after retries, or the selector is invalid
    ///
    /// Pages below the root that fail to fetch, or answer without HTML, are
    /// kept as leaves; their links are never discovered.
    pub async fn crawl(&self, start_url: &str, selector: &str) -> Result<NavigationTree, CrawlError> {
        let start_str = start_url.trim();
        let start = parse_http_url(start_str).map_err(|source| CrawlError::InvalidStartUrl {
            url: start_str.to_string(),
            source,
        })?;
        let start_authority = extract_authority(&start);

        let mut tree = NavigationTree::new(start_str);
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start_str.to_string());
        visited.insert(start.to_string());

        let mut queue: VecDeque<(Url, NodeId)> = VecDeque::new();
        queue.push_back((start, NodeId::ROOT));

        let mut fetched = 0usize;
        let mut skipped = 0usize;

        while let Some((page_url, node)) = queue.pop_front() {
            let html = match self.fetcher.fetch(page_url.as_str()).await {
                Ok(Some(html)) => html,
                Ok(None) => {
                    tracing::info!(url = %page_url, "No HTML content, not expanding");
                    skipped += 1;
                    continue;
                }
                Err(source) if node == NodeId::ROOT => {
                    return Err(CrawlError::RootFetch {
                        url: start_str.to_string(),
                        source,
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %page_url, error = %e, "Fetch failed, skipping subtree");
                    skipped += 1;
                    continue;
                }
            };
            fetched += 1;

            let links = self.extractor.extract(&html, &page_url, selector)?;

            for link in links {
                if extract_authority(&link.url) != start_authority {
                    tracing::debug!(url = %link.url, "Skipping off-site link");
                    continue;
                }

                let key = link.url.to_string();
                if !visited.insert(key.clone()) {
                    continue;
                }

                let child = tree.add_child(node, key, link.text);
                queue.push_back((link.url, child));
            }
        }

        tracing::info!(
            start = %start_str,
            pages = tree.len(),
            fetched,
            skipped,
            "Crawl complete"
        );

        Ok(tree)
    }
}
