//! Crawldown main entry point
//!
//! This is the command-line interface for crawling documentation sites into
//! local markdown.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crawldown::config::{load_config_with_hash, validate, Config, CrawlMode, CrawlRequest};
use crawldown::crawler::crawl;
use crawldown::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Crawldown: documentation sites as local markdown
///
/// Crawldown fetches a documentation or wiki site breadth-first, converts
/// every page it reaches to markdown, and writes an index.md listing them
/// all so a reader can load only the pages it needs.
#[derive(Parser, Debug)]
#[command(name = "crawldown")]
#[command(version)]
#[command(about = "Crawl documentation sites into local markdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory under which one folder per crawled domain is written
    #[arg(long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a single page
    Page {
        /// URL of the page
        url: String,
    },

    /// Crawl a whole site breadth-first
    Site {
        /// URL the crawl starts from
        url: String,

        /// Maximum link depth to follow (1-10)
        #[arg(long)]
        depth: Option<u32>,

        /// Maximum number of pages to fetch (1-500)
        #[arg(long)]
        max_pages: Option<u32>,

        /// Maximum number of concurrent fetches (1-32)
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_settings(&cli)?;
    let request = build_request(&cli.command, &config);

    if cli.dry_run {
        handle_dry_run(&config, &request);
        return Ok(());
    }

    let result = crawl(&request, &config)
        .await
        .with_context(|| format!("Crawl of {} failed", request.start_url))?;

    if !cli.quiet {
        print_summary(&result);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawldown=info,warn"),
            1 => EnvFilter::new("crawldown=debug,info"),
            2 => EnvFilter::new("crawldown=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and applies command-line overrides
fn load_settings(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.output.root_dir = dir.to_string_lossy().into_owned();
    }

    if let Command::Site {
        concurrency: Some(concurrency),
        ..
    } = &cli.command
    {
        config.crawler.concurrency = *concurrency;
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Builds the crawl request, falling back to configured budgets
fn build_request(command: &Command, config: &Config) -> CrawlRequest {
    match command {
        Command::Page { url } => CrawlRequest::page(url.as_str()),
        Command::Site {
            url,
            depth,
            max_pages,
            ..
        } => CrawlRequest::site(
            url.as_str(),
            Some(depth.unwrap_or(config.crawler.max_depth)),
            Some(max_pages.unwrap_or(config.crawler.max_pages)),
        ),
    }
}

/// Handles the --dry-run mode: shows settings and what would be crawled
fn handle_dry_run(config: &Config, request: &CrawlRequest) {
    println!("=== Crawldown Dry Run ===\n");

    println!("Request:");
    println!("  Mode: {}", request.mode);
    println!("  Start URL: {}", request.start_url);
    if request.mode == CrawlMode::Site {
        println!("  Max depth: {}", request.max_depth);
        println!("  Max pages: {}", request.max_pages);
        println!("  Concurrency: {}", config.crawler.concurrency);
        println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.user_agent.header_value());
    println!("  Timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nOutput:");
    match crawldown::url::canonicalize(&request.start_url, None) {
        Ok(start) => println!(
            "  Directory: {}",
            PathBuf::from(&config.output.root_dir)
                .join(crawldown::url::output_domain(&start))
                .display()
        ),
        Err(e) => println!("  Start URL is invalid: {}", e),
    }
}
