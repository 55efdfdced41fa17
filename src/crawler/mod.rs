//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and HTML-to-markdown conversion
//! - HTML parsing and link extraction
//! - The breadth-first frontier
//! - Overall crawl coordination

mod convert;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use convert::html_to_markdown;
pub use coordinator::{run_page_crawl, run_site_crawl, Coordinator, CoordinatorOptions};
pub use fetcher::{
    build_http_client, extract_page, fetch_url, FetchError, FetchResult, FetchedPage, Fetcher,
    HttpFetcher, MAX_REDIRECTS,
};
pub use frontier::{Frontier, FrontierEntry, Offer};
pub use parser::{parse_html, ParsedPage};

use crate::config::{Config, CrawlMode, CrawlRequest};
use crate::state::CrawlResult;
use crate::CrawlError;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the configuration
/// 2. Reset the output directory for the start URL's domain
/// 3. Fetch pages and follow same-site links within the budgets
/// 4. Write one markdown file per page plus `index.md`
///
/// # Arguments
///
/// * `request` - What to crawl and with which budgets
/// * `config` - Crawler, user agent and output settings
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Crawl completed and the index was written
/// * `Err(CrawlError)` - Crawl could not produce usable output
pub async fn crawl(request: &CrawlRequest, config: &Config) -> Result<CrawlResult, CrawlError> {
    let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
    crawl_with(request, config, Arc::new(fetcher)).await
}

/// Runs a complete crawl with the given fetcher
pub async fn crawl_with<F: Fetcher>(
    request: &CrawlRequest,
    config: &Config,
    fetcher: Arc<F>,
) -> Result<CrawlResult, CrawlError> {
    let root = Path::new(&config.output.root_dir);

    match request.mode {
        CrawlMode::Site => {
            let options = CoordinatorOptions::from_config(&config.crawler);
            run_site_crawl(request, root, fetcher, options).await
        }
        CrawlMode::Page => run_page_crawl(request, root, fetcher).await,
    }
}
