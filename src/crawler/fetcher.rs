//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests, handing redirects back to the caller
//! - Content-Type checks
//! - Error classification
//! - Turning a fetched HTML body into title, links and markdown

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::convert::html_to_markdown;
use crate::crawler::parser::parse_html;
use crate::url::canonicalize;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum number of redirect hops followed from one discovered URL
pub const MAX_REDIRECTS: u32 = 10;

/// Content types treated as HTML
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Why a single page could not be fetched
///
/// These never abort a site crawl; the page is recorded as failed instead.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("{url} is not HTML (Content-Type: {content_type})")]
    ContentMismatch { url: String, content_type: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Failed to convert {url} to markdown: {message}")]
    Conversion { url: String, message: String },

    #[error("Redirect from {url} not followed: {message}")]
    Redirect { url: String, message: String },

    #[error("Fetch task for {url} did not complete: {message}")]
    Aborted { url: String, message: String },
}

/// A page fetched and converted successfully
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// Page title (if one was extracted)
    pub title: Option<String>,

    /// Main content as markdown
    pub markdown: String,

    /// Absolute links found on the page, resolved against `final_url`
    pub links: Vec<String>,
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched and converted the page
    Success(FetchedPage),

    /// The server redirected to a different page at this absolute URL
    Redirect(Url),

    /// The page could not be used
    Failure(FetchError),
}

/// Source of fetched pages for the coordinator
///
/// Implementations must be safe to call concurrently from many tasks.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches one URL and converts it to a [`FetchResult`]
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchResult> + Send;
}

/// [`Fetcher`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawler and user agent configuration
    pub fn new(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(crawler.request_timeout_secs);
        Ok(Self::with_client(build_http_client(user_agent, timeout)?))
    }

    /// Wraps an already-built client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchResult> + Send {
        fetch_url(&self.client, url)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total time allowed for one request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use crawldown::config::UserAgentConfig;
/// use crawldown::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "DocsBot".to_string(),
///     crawler_version: "1.0".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none()) // Redirects go back through the frontier
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and converts the response into a page
///
/// # Request Flow
///
/// 1. Send GET request
/// 2. Follow redirects that stay on the same canonical page (such as
///    `/guide` to `/guide/`), up to 10 hops. Report any other redirect as
///    [`FetchResult::Redirect`] without following it
/// 3. Reject other non-2xx responses
/// 4. Reject responses whose Content-Type is not HTML
/// 5. Read the body and extract title, links and markdown
///
/// # Error Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | Request timeout | `Timeout` |
/// | Connection refused, DNS, TLS | `Network` |
/// | Non-2xx status, 3xx without a usable `Location` | `HttpStatus` |
/// | Too many redirects on the same page | `Redirect` |
/// | Non-HTML Content-Type | `ContentMismatch` |
/// | Body read failure | `Body` |
/// | Markdown conversion failure | `Conversion` |
pub async fn fetch_url(client: &Client, url: &Url) -> FetchResult {
    let mut current = url.clone();
    let mut hops = 0;

    let response = loop {
        let response = match client.get(current.clone()).send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::Failure(classify_error(url, e)),
        };

        if !response.status().is_redirection() {
            break response;
        }

        let Some(location) = redirect_location(&current, &response) else {
            return FetchResult::Failure(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        };

        if !same_page(&current, &location) {
            tracing::debug!("{} redirected to {}", url, location);
            return FetchResult::Redirect(location);
        }

        hops += 1;
        if hops > MAX_REDIRECTS {
            return FetchResult::Failure(FetchError::Redirect {
                url: url.to_string(),
                message: format!("more than {} redirects", MAX_REDIRECTS),
            });
        }
        current = location;
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::Failure(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return FetchResult::Failure(FetchError::ContentMismatch {
            url: url.to_string(),
            content_type: if content_type.is_empty() {
                "none".to_string()
            } else {
                content_type
            },
        });
    }

    let final_url = response.url().clone();
    match response.text().await {
        Ok(body) => extract_page(&body, final_url),
        Err(e) if e.is_timeout() => FetchResult::Failure(FetchError::Timeout {
            url: url.to_string(),
        }),
        Err(e) => FetchResult::Failure(FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Parses an HTML body and converts its main content to markdown
///
/// Links are resolved against `final_url` so relative links on redirected
/// pages point where the browser would send them.
pub fn extract_page(body: &str, final_url: Url) -> FetchResult {
    let parsed = parse_html(body, &final_url);

    match html_to_markdown(&parsed.content_html) {
        Ok(markdown) => FetchResult::Success(FetchedPage {
            final_url,
            title: parsed.title,
            markdown,
            links: parsed.links,
        }),
        Err(e) => FetchResult::Failure(FetchError::Conversion {
            url: final_url.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Resolves the `Location` header of a redirect against the request URL
fn redirect_location(url: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    url.join(location.trim()).ok()
}

/// Whether two URLs share a canonical form
fn same_page(a: &Url, b: &Url) -> bool {
    match (canonicalize(a.as_str(), None), canonicalize(b.as_str(), None)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn is_html(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_CONTENT_TYPES.contains(&essence.as_str())
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "connection failed".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
