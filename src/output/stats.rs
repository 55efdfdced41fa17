//! End-of-crawl summary
//!
//! This module renders the short report printed to stdout once a crawl has
//! finished and its index has been written.

use crate::config::CrawlMode;
use crate::state::CrawlResult;

/// Prints the crawl summary to stdout
///
/// # Arguments
///
/// * `result` - The finished crawl
pub fn print_summary(result: &CrawlResult) {
    print!("{}", format_summary(result));
}

/// Formats the crawl summary shown at the end of a run
pub fn format_summary(result: &CrawlResult) -> String {
    let mut out = String::new();
    let elapsed = (result.finished_at - result.started_at).num_milliseconds() as f64 / 1000.0;

    match result.mode {
        CrawlMode::Page => {
            out.push_str("=== Page Saved ===\n\n");
            if let Some(record) = result.ok_records().next() {
                out.push_str(&format!("  Title: {}\n", record.display_title()));
                if let Some(path) = &record.relative_path {
                    out.push_str(&format!("  File: {}\n", result.output_dir.join(path).display()));
                }
                out.push_str(&format!("  Size: {} chars\n", record.content_chars));
            } else {
                out.push_str("  No page was written\n");
            }
        }
        CrawlMode::Site => {
            out.push_str("=== Crawl Complete ===\n\n");
            out.push_str(&format!("  Start URL: {}\n", result.start_url));
            out.push_str(&format!("  Pages crawled: {}\n", result.ok_count()));
            out.push_str(&format!("  Pages failed: {}\n", result.failed_count()));
            out.push_str(&format!(
                "  Total content: {} chars\n",
                result.total_content_chars()
            ));
            out.push_str(&format!("  Pages dir: {}\n", result.pages_dir().display()));
        }
    }

    out.push_str(&format!("  Index: {}\n", result.index_path().display()));
    out.push_str(&format!("  Elapsed: {:.1}s\n", elapsed));

    if result.mode == CrawlMode::Site && result.ok_count() > 0 {
        out.push_str(&format!(
            "\nStart with {} to find the pages you need.\n",
            result.index_path().display()
        ));
    }

    out
}
