//! Crawler module for navigation discovery
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and backoff
//! - Navigation link extraction with CSS selectors
//! - The breadth-first, same-site traversal
//! - The tree the traversal produces

mod fetcher;
mod parser;
mod retry;
mod traversal;
mod tree;

pub use fetcher::{build_http_client, fetch_once, FetchError, HttpFetcher, PageFetcher};
pub use parser::{extract_nav_links, CssLinkExtractor, ExtractError, LinkExtractor, NavLink};
pub use retry::{RetryPolicy, MAX_BACKOFF};
pub use traversal::{CrawlError, Navigator};
pub use tree::{NavigationNode, NavigationTree, NodeId};
