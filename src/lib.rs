//! Crawldown: documentation sites as local markdown
//!
//! This crate crawls a documentation or wiki site breadth-first and writes every
//! page it reaches as a markdown file, together with an `index.md` that lets a
//! reader pick out only the pages it needs.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crawl operations
///
/// Only errors that make the whole crawl unusable surface here. Failures of
/// individual pages are recorded on their [`state::PageRecord`] instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(#[from] UrlError),

    #[error("Start URL {url} could not be fetched: {source}")]
    StartUrlUnreachable {
        url: String,
        source: crawler::FetchError,
    },

    #[error("Cannot prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write index: {0}")]
    Index(#[source] output::OutputError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

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

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlMode, CrawlRequest};
pub use crawler::{crawl, Fetcher, HttpFetcher};
pub use state::{CrawlResult, FailureStage, PageRecord, PageStatus};
pub use self::url::{canonicalize, in_scope, CanonicalUrl};
