use std::fmt;
use std::ops::RangeInclusive;

/// Allowed values for a site crawl's maximum depth
pub const MAX_DEPTH_RANGE: RangeInclusive<u32> = 1..=10;

/// Allowed values for a site crawl's page budget
pub const MAX_PAGES_RANGE: RangeInclusive<u32> = 1..=500;

/// Maximum depth used when none is given
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Page budget used when none is given
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// The two ways a crawl can be run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Breadth-first crawl of every same-site page within the budgets
    Site,
    /// Fetch and write exactly one page
    Page,
}

impl CrawlMode {
    /// Returns the lowercase name used in the index and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of a single crawl
///
/// Budgets are clamped into their allowed ranges at construction time, so a
/// `CrawlRequest` is always valid once built. It is never mutated after the
/// crawl begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// The URL the crawl starts from, as given by the caller
    pub start_url: String,

    /// Site or single-page crawl
    pub mode: CrawlMode,

    /// Deepest link level that will be fetched (start URL is depth 0)
    pub max_depth: u32,

    /// Maximum number of pages fetched, start URL included
    pub max_pages: u32,
}

impl CrawlRequest {
    /// Builds a site crawl request, applying defaults and clamping budgets
    ///
    /// # Example
    ///
    /// ```
    /// use crawldown::config::CrawlRequest;
    ///
    /// let request = CrawlRequest::site("https://docs.example.com/", Some(25), None);
    /// assert_eq!(request.max_depth, 10);
    /// assert_eq!(request.max_pages, 50);
    /// ```
    pub fn site(
        start_url: impl Into<String>,
        max_depth: Option<u32>,
        max_pages: Option<u32>,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            mode: CrawlMode::Site,
            max_depth: clamp_budget(
                "max_depth",
                max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
                MAX_DEPTH_RANGE,
            ),
            max_pages: clamp_budget(
                "max_pages",
                max_pages.unwrap_or(DEFAULT_MAX_PAGES),
                MAX_PAGES_RANGE,
            ),
        }
    }

    /// Builds a single-page request
    ///
    /// The page is recorded at depth 0; budgets sit at their minimum.
    pub fn page(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            mode: CrawlMode::Page,
            max_depth: *MAX_DEPTH_RANGE.start(),
            max_pages: 1,
        }
    }
}

/// Clamps a budget into `range`, logging when the value had to change
fn clamp_budget(name: &str, value: u32, range: RangeInclusive<u32>) -> u32 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        tracing::warn!(
            "{} = {} is outside {}..={}, using {}",
            name,
            value,
            range.start(),
            range.end(),
            clamped
        );
    }
    clamped
}
