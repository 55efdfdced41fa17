use super::{FailureStage, PageStatus};
use crate::config::CrawlMode;
use crate::url::CanonicalUrl;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Record of one fetch attempt
///
/// Created exactly once per frontier entry taken by the coordinator, after
/// its fetch completes. An entry that redirects hands its record over to the
/// redirect target, and none is created when that target was already seen.
/// Failed records carry no sequence number and no file.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Canonical URL of the page
    pub url: CanonicalUrl,

    /// Page title (if one was extracted)
    pub title: Option<String>,

    /// Link distance from the start URL
    pub depth: u32,

    /// Write-order sequence number (ok records only)
    pub sequence: Option<u32>,

    /// Path of the written file relative to the output directory, `/`-separated
    pub relative_path: Option<String>,

    /// Size of the markdown body in characters
    pub content_chars: usize,

    /// Outcome of the fetch attempt
    pub status: PageStatus,

    /// Failure reason (failed records only)
    pub error: Option<String>,

    /// Step the page was lost at (failed records only)
    pub failed_at: Option<FailureStage>,
}

impl PageRecord {
    /// Creates a record for a page that was fetched and written
    pub fn ok(
        url: CanonicalUrl,
        title: Option<String>,
        depth: u32,
        sequence: u32,
        relative_path: String,
        content_chars: usize,
    ) -> Self {
        Self {
            url,
            title,
            depth,
            sequence: Some(sequence),
            relative_path: Some(relative_path),
            content_chars,
            status: PageStatus::Ok,
            error: None,
            failed_at: None,
        }
    }

    /// Creates a record for a page that could not be fetched
    pub fn failed(url: CanonicalUrl, depth: u32, error: impl Into<String>) -> Self {
        Self {
            url,
            title: None,
            depth,
            sequence: None,
            relative_path: None,
            content_chars: 0,
            status: PageStatus::Failed,
            error: Some(error.into()),
            failed_at: Some(FailureStage::Fetch),
        }
    }

    /// Creates a record for a fetched page whose file could not be written
    pub fn write_failed(
        url: CanonicalUrl,
        title: Option<String>,
        depth: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            title,
            failed_at: Some(FailureStage::Write),
            ..Self::failed(url, depth, error)
        }
    }

    /// Returns the title, falling back to the URL when none was extracted
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => self.url.as_str(),
        }
    }
}

/// Outcome of a complete crawl run
///
/// Produced once, after every fetch has finished and every page write has
/// happened. Records are kept in the order they were processed, which is also
/// the order ok records were written in.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Canonical start URL
    pub start_url: CanonicalUrl,

    /// Output directory name (canonical host of the start URL)
    pub domain: String,

    /// `<root>/<domain>`
    pub output_dir: PathBuf,

    /// Site or single-page crawl
    pub mode: CrawlMode,

    /// Depth budget the crawl ran with
    pub max_depth: u32,

    /// Page budget the crawl ran with
    pub max_pages: u32,

    /// One record per fetch attempt
    pub records: Vec<PageRecord>,

    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the last page finished
    pub finished_at: DateTime<Utc>,
}

impl CrawlResult {
    /// Iterates over ok records in ascending sequence order
    pub fn ok_records(&self) -> impl Iterator<Item = &PageRecord> {
        let mut ok: Vec<&PageRecord> = self
            .records
            .iter()
            .filter(|r| r.status.is_success())
            .collect();
        ok.sort_by_key(|r| r.sequence);
        ok.into_iter()
    }

    /// Number of pages written
    pub fn ok_count(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_success()).count()
    }

    /// Number of pages that failed
    pub fn failed_count(&self) -> usize {
        self.records.len() - self.ok_count()
    }

    /// Number of failed pages lost at the given step
    pub fn failed_at_count(&self, stage: FailureStage) -> usize {
        self.records
            .iter()
            .filter(|r| r.failed_at == Some(stage))
            .count()
    }

    /// Total markdown characters across written pages
    pub fn total_content_chars(&self) -> usize {
        self.ok_records().map(|r| r.content_chars).sum()
    }

    /// Path of the navigation document
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join("index.md")
    }

    /// Directory holding the page files
    pub fn pages_dir(&self) -> PathBuf {
        self.output_dir.join("pages")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> CanonicalUrl {
        CanonicalUrl::parse(&format!("https://docs.example.com{}", path)).unwrap()
    }

    fn result_with(records: Vec<PageRecord>) -> CrawlResult {
        let now = Utc::now();
        CrawlResult {
            start_url: url("/"),
            domain: "docs.example.com".to_string(),
            output_dir: PathBuf::from(".crawl/docs.example.com"),
            mode: CrawlMode::Site,
            max_depth: 3,
            max_pages: 50,
            records,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_display_title_falls_back_to_url() {
        let record = PageRecord::ok(url("/guide"), None, 1, 0, "pages/000_guide.md".into(), 10);
        assert_eq!(record.display_title(), "https://docs.example.com/guide");

        let blank = PageRecord::ok(
            url("/guide"),
            Some("   ".to_string()),
            1,
            0,
            "pages/000_guide.md".into(),
            10,
        );
        assert_eq!(blank.display_title(), "https://docs.example.com/guide");
    }

    #[test]
    fn test_failed_record_has_no_file() {
        let record = PageRecord::failed(url("/broken"), 2, "HTTP 500");
        assert_eq!(record.status, PageStatus::Failed);
        assert_eq!(record.sequence, None);
        assert_eq!(record.relative_path, None);
        assert_eq!(record.error.as_deref(), Some("HTTP 500"));
        assert_eq!(record.failed_at, Some(FailureStage::Fetch));
    }

    #[test]
    fn test_write_failed_record() {
        let record = PageRecord::write_failed(url("/guide"), Some("Guide".into()), 1, "disk full");
        assert_eq!(record.status, PageStatus::Failed);
        assert_eq!(record.failed_at, Some(FailureStage::Write));
        assert_eq!(record.title.as_deref(), Some("Guide"));
        assert_eq!(record.sequence, None);

        let result = result_with(vec![
            record,
            PageRecord::failed(url("/gone"), 1, "HTTP 404"),
            PageRecord::failed(url("/down"), 1, "HTTP 503"),
        ]);
        assert_eq!(result.failed_count(), 3);
        assert_eq!(result.failed_at_count(FailureStage::Fetch), 2);
        assert_eq!(result.failed_at_count(FailureStage::Write), 1);
    }

    #[test]
    fn test_counts_and_ordering() {
        let result = result_with(vec![
            PageRecord::ok(url("/"), Some("Home".into()), 0, 0, "pages/000_index.md".into(), 100),
            PageRecord::failed(url("/gone"), 1, "HTTP 404"),
            PageRecord::ok(url("/b"), None, 1, 2, "pages/002_b.md".into(), 5),
            PageRecord::ok(url("/a"), None, 1, 1, "pages/001_a.md".into(), 20),
        ]);

        assert_eq!(result.ok_count(), 3);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.total_content_chars(), 125);

        let sequences: Vec<_> = result.ok_records().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_paths() {
        let result = result_with(vec![]);
        assert_eq!(
            result.index_path(),
            PathBuf::from(".crawl/docs.example.com/index.md")
        );
        assert_eq!(
            result.pages_dir(),
            PathBuf::from(".crawl/docs.example.com/pages")
        );
    }
}
