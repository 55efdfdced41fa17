//! Index document generation
//!
//! The index is the entry point of a crawl's output: one line per written
//! page, in write order, so a reader can pick the pages it needs without
//! opening all of them.

use crate::output::error::{OutputError, OutputResult};
use crate::state::{CrawlResult, FailureStage};
use chrono::SecondsFormat;
use std::path::PathBuf;

/// Writes `index.md` into the crawl's output directory
///
/// # Arguments
///
/// * `result` - The finished crawl
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written index
/// * `Err(OutputError)` - Failed to write the index
pub async fn write_index(result: &CrawlResult) -> OutputResult<PathBuf> {
    let path = result.index_path();
    let markdown = format_index(result);

    tokio::fs::write(&path, markdown)
        .await
        .map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

/// Formats a crawl result as the index document
///
/// # Arguments
///
/// * `result` - The finished crawl
///
/// # Returns
///
/// A formatted markdown string
pub fn format_index(result: &CrawlResult) -> String {
    let mut md = String::new();

    // Header
    md.push_str(&format!("# Crawl Index: {}\n\n", result.start_url));
    md.push_str(&format!("- Domain: {}\n", result.domain));
    md.push_str(&format!("- Mode: {}\n", result.mode));
    md.push_str(&format!("- Max depth: {}\n", result.max_depth));
    md.push_str(&format!(
        "- Pages: {} crawled, {} failed\n",
        result.ok_count(),
        result.failed_count()
    ));
    md.push_str(&format!(
        "- Started: {}\n",
        result.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    md.push_str(&format!(
        "- Finished: {}\n\n",
        result.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    // Pages
    md.push_str("## Pages\n\n");
    for record in result.ok_records() {
        let (Some(sequence), Some(path)) = (record.sequence, record.relative_path.as_deref())
        else {
            continue;
        };

        md.push_str(&format!(
            "- {:03} [{}]({}) (depth {}, {} chars) {}\n",
            sequence,
            escape_title(record.display_title()),
            path,
            record.depth,
            record.content_chars,
            record.url
        ));
    }

    // Failures
    let fetch_failed = result.failed_at_count(FailureStage::Fetch);
    let write_failed = result.failed_at_count(FailureStage::Write);
    if fetch_failed + write_failed > 0 {
        md.push('\n');
    }
    if fetch_failed > 0 {
        md.push_str(&format!("{} failed to fetch\n", pages(fetch_failed)));
    }
    if write_failed > 0 {
        md.push_str(&format!("{} failed to write\n", pages(write_failed)));
    }

    md
}

fn pages(count: usize) -> String {
    format!("{} {}", count, if count == 1 { "page" } else { "pages" })
}

/// Escapes characters that would break a markdown link label
fn escape_title(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            '[' | ']' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}
