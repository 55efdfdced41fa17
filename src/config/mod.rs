//! Configuration module
//!
//! This module handles the optional TOML configuration file and the
//! [`CrawlRequest`] that describes a single crawl.
//!
//! # Example
//!
//! ```no_run
//! use crawldown::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawldown.toml")).unwrap();
//! println!("Crawler will use concurrency: {}", config.crawler.concurrency);
//! ```

mod parser;
mod request;
mod types;
mod validation;

// Re-export types
pub use request::{
    CrawlMode, CrawlRequest, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, MAX_DEPTH_RANGE,
    MAX_PAGES_RANGE,
};
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
