//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Keeping a bounded number of fetches in flight
//! - Feeding discovered links back into the frontier
//! - Handing fetched pages to the page writer in a deterministic order
//! - Producing the crawl result and the index document

use crate::config::{CrawlMode, CrawlRequest, CrawlerConfig};
use crate::crawler::fetcher::{FetchError, FetchResult, Fetcher, MAX_REDIRECTS};
use crate::crawler::frontier::{Frontier, FrontierEntry, Offer};
use crate::output::{write_index, OutputDir, PageWriter};
use crate::state::{CrawlResult, PageRecord};
use crate::url::{canonicalize, in_scope, output_domain, CanonicalUrl};
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// How often (in processed pages) progress is logged
const PROGRESS_INTERVAL: usize = 10;

/// Tuning knobs for the fetch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Maximum number of fetches in flight at once
    pub concurrency: usize,

    /// Delay applied before every fetch
    pub request_delay: Duration,
}

impl CoordinatorOptions {
    /// Takes the concurrency and delay settings from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Main crawler coordinator structure
///
/// The coordinator task is the only owner of the frontier, the visited set
/// and the page writer. Fetch tasks never touch them; they only hand their
/// [`FetchResult`] back through the join set.
///
/// Completed fetches are processed in dispatch order, not completion order.
/// Combined with the FIFO frontier this makes the set of pages, their write
/// order and their sequence numbers depend only on page contents.
///
/// Redirects are not followed inside a fetch. The target goes back through
/// the frontier, so it is deduplicated and scope-checked like any link.
pub struct Coordinator<F: Fetcher> {
    fetcher: Arc<F>,
    frontier: Frontier,
    writer: PageWriter,
    start_host: String,
    options: CoordinatorOptions,
    /// Redirect hops taken to reach each queued redirect target
    redirect_hops: HashMap<CanonicalUrl, u32>,
}

impl<F: Fetcher> Coordinator<F> {
    /// Creates a coordinator over a seeded frontier
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of pages
    /// * `frontier` - Frontier holding the start URL
    /// * `writer` - Writer for the crawl's output directory
    /// * `start_host` - Host that discovered links must match to be followed
    /// * `options` - Concurrency and politeness settings
    pub fn new(
        fetcher: Arc<F>,
        frontier: Frontier,
        writer: PageWriter,
        start_host: impl Into<String>,
        options: CoordinatorOptions,
    ) -> Self {
        Self {
            fetcher,
            frontier,
            writer,
            start_host: start_host.into(),
            options,
            redirect_hops: HashMap::new(),
        }
    }

    /// Runs the main crawl loop until the frontier is drained
    ///
    /// Each iteration:
    /// 1. Tops up in-flight fetches from the frontier, up to `concurrency`
    /// 2. Stops once nothing is in flight (the frontier is then drained)
    /// 3. Reaps one completed fetch
    /// 4. Processes every completed fetch whose turn has come
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PageRecord>)` - One record per page fetched or failed, in
    ///   dispatch order. Redirects leave no record of their own.
    /// * `Err(CrawlError::StartUrlUnreachable)` - The first page could not be fetched
    pub async fn run(mut self) -> Result<Vec<PageRecord>, CrawlError> {
        let start_time = Instant::now();
        let concurrency = self.options.concurrency.max(1);

        let mut in_flight: JoinSet<(usize, FetchResult)> = JoinSet::new();
        let mut waiting: BTreeMap<usize, FrontierEntry> = BTreeMap::new();
        let mut completed: BTreeMap<usize, FetchResult> = BTreeMap::new();
        let mut records = Vec::new();
        let mut dispatched = 0;
        let mut next_to_process = 0;
        let mut processed = 0;
        let mut seed_error = None;

        loop {
            // Phase 1: Top-up in-flight fetches
            while in_flight.len() < concurrency {
                let Some(entry) = self.frontier.take() else {
                    break;
                };

                tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);
                self.spawn_fetch(&mut in_flight, dispatched, entry.url.clone());
                waiting.insert(dispatched, entry);
                dispatched += 1;
            }

            // Phase 2: Check termination condition
            if in_flight.is_empty() {
                break;
            }

            // Phase 3: Reap one completed fetch
            match in_flight.join_next().await {
                Some(Ok((index, result))) => {
                    completed.insert(index, result);
                }
                Some(Err(e)) => {
                    tracing::error!("Fetch task join error: {}", e);
                }
                None => break,
            }

            // Phase 4: Process completed fetches in dispatch order
            while let Some(result) = completed.remove(&next_to_process) {
                let Some(entry) = waiting.remove(&next_to_process) else {
                    break;
                };

                if let Some(record) = self.process(entry, result, &mut seed_error).await {
                    records.push(record);
                }
                next_to_process += 1;
                processed += 1;

                if processed % PROGRESS_INTERVAL == 0 {
                    let rate = processed as f64 / start_time.elapsed().as_secs_f64();
                    tracing::info!(
                        "Progress: {} fetches done, {} queued, {} in flight, {:.2}/sec",
                        processed,
                        self.frontier.len(),
                        in_flight.len(),
                        rate
                    );
                }
            }
        }

        // Entries whose task was lost never completed; record them as failed
        for (index, entry) in std::mem::take(&mut waiting) {
            let result = completed.remove(&index).unwrap_or_else(|| {
                FetchResult::Failure(FetchError::Aborted {
                    url: entry.url.to_string(),
                    message: "fetch task was lost".to_string(),
                })
            });
            if let Some(record) = self.process(entry, result, &mut seed_error).await {
                records.push(record);
            }
        }

        if let Some((url, source)) = seed_error {
            return Err(CrawlError::StartUrlUnreachable { url, source });
        }

        tracing::info!(
            "Crawl loop finished: {} pages written, {} failed in {:?}",
            self.writer.pages_written(),
            records.iter().filter(|r| !r.status.is_success()).count(),
            start_time.elapsed()
        );

        Ok(records)
    }

    /// Spawns the fetch for one dispatched entry
    ///
    /// The fetch itself runs in its own task so that a panic inside the
    /// fetcher still reports back under the right dispatch index.
    fn spawn_fetch(
        &self,
        in_flight: &mut JoinSet<(usize, FetchResult)>,
        index: usize,
        url: CanonicalUrl,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let delay = self.options.request_delay;
        let url_string = url.to_string();

        in_flight.spawn(async move {
            let task = tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                fetcher.fetch(url.as_url()).await
            });

            let result = match task.await {
                Ok(result) => result,
                Err(e) => FetchResult::Failure(FetchError::Aborted {
                    url: url_string,
                    message: e.to_string(),
                }),
            };
            (index, result)
        });
    }

    /// Turns one completed fetch into a page record
    ///
    /// On success the page's links are offered to the frontier before the
    /// page is written. A failed write is recorded and the crawl goes on.
    /// Redirects queue their target and yield no record.
    async fn process(
        &mut self,
        entry: FrontierEntry,
        result: FetchResult,
        seed_error: &mut Option<(String, FetchError)>,
    ) -> Option<PageRecord> {
        match result {
            FetchResult::Success(page) => {
                let url = match self.settle_final_url(&entry, &page.final_url) {
                    Ok(Some(url)) => url,
                    Ok(None) => return None,
                    Err(error) => return Some(fetch_failed(entry, error, seed_error)),
                };
                let entry = FrontierEntry {
                    url,
                    depth: entry.depth,
                };

                self.offer_links(&entry, &page.links);

                let content_chars = page.markdown.chars().count();
                let record = match self
                    .writer
                    .write(&entry, page.title.as_deref(), &page.markdown)
                    .await
                {
                    Ok(written) => PageRecord::ok(
                        entry.url,
                        page.title,
                        entry.depth,
                        written.sequence,
                        written.relative_path,
                        content_chars,
                    ),
                    Err(e) => {
                        tracing::warn!("Failed to save {}: {}", entry.url, e);
                        let error = e.to_string();
                        PageRecord::write_failed(entry.url, page.title, entry.depth, error)
                    }
                };
                Some(record)
            }

            FetchResult::Redirect(location) => match self.follow_redirect(&entry, &location) {
                Ok(()) => None,
                Err(error) => Some(fetch_failed(entry, error, seed_error)),
            },

            FetchResult::Failure(error) => Some(fetch_failed(entry, error, seed_error)),
        }
    }

    /// Queues the target of a redirect in place of the entry that got it
    fn follow_redirect(
        &mut self,
        entry: &FrontierEntry,
        location: &Url,
    ) -> Result<(), FetchError> {
        let hops = self.redirect_hops.remove(&entry.url).unwrap_or(0) + 1;
        if hops > MAX_REDIRECTS {
            return Err(redirect_error(
                entry,
                format!("more than {} redirects", MAX_REDIRECTS),
            ));
        }

        let target = canonicalize(location.as_str(), None)
            .map_err(|e| redirect_error(entry, format!("{}: {}", location, e)))?;

        if !self.accept_redirect_host(entry, &target) {
            return Err(redirect_error(
                entry,
                format!("{} is outside {}", target, self.start_host),
            ));
        }

        match self.frontier.redirect(target.clone(), entry.depth) {
            Offer::Queued => {
                tracing::debug!("{} redirects to {}", entry.url, target);
                self.redirect_hops.insert(target, hops);
            }
            _ => tracing::debug!("{} redirects to already seen {}", entry.url, target),
        }
        Ok(())
    }

    /// Checks where a fetcher that follows redirects itself actually landed
    ///
    /// Returns the URL to record the page under, or `None` when the landing
    /// URL was already seen and the page must not be written twice.
    fn settle_final_url(
        &mut self,
        entry: &FrontierEntry,
        final_url: &Url,
    ) -> Result<Option<CanonicalUrl>, FetchError> {
        let landed = match canonicalize(final_url.as_str(), None) {
            Ok(url) if url != entry.url => url,
            _ => return Ok(Some(entry.url.clone())),
        };

        if !self.accept_redirect_host(entry, &landed) {
            return Err(redirect_error(
                entry,
                format!("{} is outside {}", landed, self.start_host),
            ));
        }

        if !self.frontier.mark_visited(landed.clone()) {
            tracing::debug!("{} landed on already seen {}", entry.url, landed);
            return Ok(None);
        }

        Ok(Some(landed))
    }

    /// Whether a redirect target may be crawled
    ///
    /// A redirect of the start URL to another host moves the crawl scope to
    /// that host, e.g. `example.com` to `www.example.com`.
    fn accept_redirect_host(&mut self, entry: &FrontierEntry, target: &CanonicalUrl) -> bool {
        if in_scope(target, &self.start_host) {
            return true;
        }

        if entry.depth == 0 {
            tracing::info!(
                "Start URL redirected to {}, crawling {} instead of {}",
                target,
                target.host(),
                self.start_host
            );
            self.start_host = target.host().to_string();
            return true;
        }

        false
    }

    /// Canonicalizes a page's links and offers the in-scope ones
    fn offer_links(&mut self, entry: &FrontierEntry, links: &[String]) {
        let depth = entry.depth + 1;
        if depth > self.frontier.max_depth() {
            tracing::debug!(
                "{} is at max depth, not following its {} links",
                entry.url,
                links.len()
            );
            return;
        }

        let mut queued = 0;
        for link in links {
            let url = match canonicalize(link, Some(entry.url.as_url())) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Dropping link {}: {}", link, e);
                    continue;
                }
            };

            if !in_scope(&url, &self.start_host) {
                tracing::trace!("Skipping out-of-scope link {}", url);
                continue;
            }

            if self.frontier.offer(url, depth) == Offer::Queued {
                queued += 1;
            }
        }

        tracing::debug!("{}: {} links, {} queued", entry.url, links.len(), queued);
    }
}

/// Runs a breadth-first crawl of one site
///
/// The output directory is reset before the start URL is fetched, so an
/// unreachable start URL leaves an empty directory behind. Page mode fetches
/// first instead, see [`run_page_crawl`].
///
/// # Crawl Flow
///
/// 1. Canonicalize the start URL
/// 2. Reset `<root>/<domain>`
/// 3. Seed the frontier and run the coordinator
/// 4. Write `index.md`
///
/// # Errors
///
/// * `InvalidStartUrl` - The start URL is not an absolute HTTP(S) URL
/// * `OutputDir` - The output directory could not be prepared
/// * `StartUrlUnreachable` - The start URL itself could not be fetched
/// * `Index` - The index could not be written
pub async fn run_site_crawl<F: Fetcher>(
    request: &CrawlRequest,
    root: &Path,
    fetcher: Arc<F>,
    options: CoordinatorOptions,
) -> Result<CrawlResult, CrawlError> {
    let started_at = Utc::now();
    let start = canonicalize(&request.start_url, None)?;
    let domain = output_domain(&start);

    tracing::info!(
        "Starting site crawl of {} (max depth {}, max pages {}, concurrency {})",
        start,
        request.max_depth,
        request.max_pages,
        options.concurrency
    );

    let output = OutputDir::acquire(root, &domain).await?;

    let mut frontier = Frontier::new(request.max_depth, request.max_pages as usize);
    frontier.seed(start.clone());

    let coordinator = Coordinator::new(
        fetcher,
        frontier,
        PageWriter::new(&output),
        start.host(),
        options,
    );
    let records = coordinator.run().await?;

    finish(request, start, domain, &output, records, started_at).await
}

/// Fetches and writes exactly one page
///
/// The page is fetched before the output directory is touched, so a failed
/// fetch leaves any previous output in place and writes no index.
///
/// # Errors
///
/// * `InvalidStartUrl` - The URL is not an absolute HTTP(S) URL
/// * `StartUrlUnreachable` - The page could not be fetched
/// * `OutputDir` - The output directory could not be prepared
/// * `Index` - The index could not be written
pub async fn run_page_crawl<F: Fetcher>(
    request: &CrawlRequest,
    root: &Path,
    fetcher: Arc<F>,
) -> Result<CrawlResult, CrawlError> {
    let started_at = Utc::now();
    let start = canonicalize(&request.start_url, None)?;

    tracing::info!("Fetching single page {}", start);

    let start_failed = |source: FetchError| CrawlError::StartUrlUnreachable {
        url: start.to_string(),
        source,
    };

    let mut entry = FrontierEntry {
        url: start.clone(),
        depth: 0,
    };
    let mut hops = 0;
    let page = loop {
        match fetcher.fetch(entry.url.as_url()).await {
            FetchResult::Success(page) => break page,
            FetchResult::Redirect(_) if hops == MAX_REDIRECTS => {
                let message = format!("more than {} redirects", MAX_REDIRECTS);
                return Err(start_failed(redirect_error(&entry, message)));
            }
            FetchResult::Redirect(location) => {
                hops += 1;
                let target = canonicalize(location.as_str(), None).map_err(|e| {
                    start_failed(redirect_error(&entry, format!("{}: {}", location, e)))
                })?;
                tracing::debug!("Following redirect to {}", target);
                entry.url = target;
            }
            FetchResult::Failure(source) => return Err(start_failed(source)),
        }
    };

    let domain = output_domain(&start);
    let output = OutputDir::acquire(root, &domain).await?;
    let mut writer = PageWriter::new(&output);

    let content_chars = page.markdown.chars().count();
    let record = match writer
        .write(&entry, page.title.as_deref(), &page.markdown)
        .await
    {
        Ok(written) => PageRecord::ok(
            entry.url,
            page.title,
            0,
            written.sequence,
            written.relative_path,
            content_chars,
        ),
        Err(e) => {
            tracing::warn!("Failed to save {}: {}", entry.url, e);
            PageRecord::write_failed(entry.url, page.title, 0, e.to_string())
        }
    };

    finish(request, start, domain, &output, vec![record], started_at).await
}

/// Records a page that could not be fetched
///
/// A failure at depth 0 is the start URL (or a redirect of it) failing.
fn fetch_failed(
    entry: FrontierEntry,
    error: FetchError,
    seed_error: &mut Option<(String, FetchError)>,
) -> PageRecord {
    tracing::warn!("Failed to fetch {}: {}", entry.url, error);
    let record = PageRecord::failed(entry.url.clone(), entry.depth, error.to_string());
    if entry.depth == 0 && seed_error.is_none() {
        *seed_error = Some((entry.url.to_string(), error));
    }
    record
}

fn redirect_error(entry: &FrontierEntry, message: String) -> FetchError {
    FetchError::Redirect {
        url: entry.url.to_string(),
        message,
    }
}

/// Builds the crawl result and writes the index
async fn finish(
    request: &CrawlRequest,
    start_url: CanonicalUrl,
    domain: String,
    output: &OutputDir,
    records: Vec<PageRecord>,
    started_at: DateTime<Utc>,
) -> Result<CrawlResult, CrawlError> {
    let result = CrawlResult {
        start_url,
        domain,
        output_dir: output.path().to_path_buf(),
        mode: request.mode,
        max_depth: match request.mode {
            CrawlMode::Site => request.max_depth,
            CrawlMode::Page => 0,
        },
        max_pages: request.max_pages,
        records,
        started_at,
        finished_at: Utc::now(),
    };

    let index_path = write_index(&result).await.map_err(CrawlError::Index)?;

    tracing::info!(
        "Crawl completed: {} pages written, {} failed, index at {}",
        result.ok_count(),
        result.failed_count(),
        index_path.display()
    );

    Ok(result)
}
