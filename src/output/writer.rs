//! Page files and the per-domain output directory
//!
//! Every successfully fetched page becomes one markdown file under
//! `<root>/<domain>/pages/`, named `<seq:03>_<slug>.md`.

use crate::crawler::FrontierEntry;
use crate::output::error::{OutputError, OutputResult};
use crate::url::CanonicalUrl;
use crate::CrawlError;
use std::path::{Path, PathBuf};

/// Maximum slug length in characters
const MAX_SLUG_LEN: usize = 100;

/// Name of the directory holding page files
pub const PAGES_DIR: &str = "pages";

/// Name of the navigation document
pub const INDEX_FILE: &str = "index.md";

/// The output directory of one crawl: `<root>/<domain>`
#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Prepares an empty output directory for a fresh crawl
    ///
    /// Anything left from a previous crawl of the same domain is removed and
    /// an empty `pages/` directory is created in its place.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::OutputDir`] when the old directory cannot be
    /// removed or the new one cannot be created.
    pub async fn acquire(root: &Path, domain: &str) -> Result<Self, CrawlError> {
        let path = root.join(domain);

        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => tracing::debug!("Cleared previous output in {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(CrawlError::OutputDir { path, source }),
        }

        let pages = path.join(PAGES_DIR);
        if let Err(source) = tokio::fs::create_dir_all(&pages).await {
            return Err(CrawlError::OutputDir { path, source });
        }

        Ok(Self { path })
    }

    /// `<root>/<domain>`
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<root>/<domain>/pages`
    pub fn pages_dir(&self) -> PathBuf {
        self.path.join(PAGES_DIR)
    }

    /// `<root>/<domain>/index.md`
    pub fn index_path(&self) -> PathBuf {
        self.path.join(INDEX_FILE)
    }
}

/// A page file that was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    /// Sequence number embedded in the file name
    pub sequence: u32,

    /// Path relative to the output directory, e.g. `pages/000_index.md`
    pub relative_path: String,
}

/// Writes page files and hands out their sequence numbers
///
/// The writer is owned by a single task. The counter only moves after a file
/// has been written, so the numbers of written files are always `0..n`.
#[derive(Debug)]
pub struct PageWriter {
    output_dir: PathBuf,
    next_sequence: u32,
}

impl PageWriter {
    /// Creates a writer for an acquired output directory
    pub fn new(output_dir: &OutputDir) -> Self {
        Self {
            output_dir: output_dir.path().to_path_buf(),
            next_sequence: 0,
        }
    }

    /// Writes one page and returns where it went
    ///
    /// # Arguments
    ///
    /// * `entry` - The frontier entry the page was fetched for
    /// * `title` - Extracted page title, if any
    /// * `content` - Page body as markdown
    ///
    /// # Returns
    ///
    /// * `Ok(WrittenPage)` - The file's sequence number and relative path
    /// * `Err(OutputError)` - The file could not be written; no number was used
    pub async fn write(
        &mut self,
        entry: &FrontierEntry,
        title: Option<&str>,
        content: &str,
    ) -> OutputResult<WrittenPage> {
        let sequence = self.next_sequence;
        let file_name = page_file_name(sequence, &entry.url);
        let path = self.output_dir.join(PAGES_DIR).join(&file_name);

        let document = render_page(title, &entry.url, entry.depth, content);
        tokio::fs::write(&path, document)
            .await
            .map_err(|source| OutputError::Write { path, source })?;

        self.next_sequence += 1;
        tracing::debug!("Wrote {} for {}", file_name, entry.url);

        Ok(WrittenPage {
            sequence,
            relative_path: format!("{}/{}", PAGES_DIR, file_name),
        })
    }

    /// Number of pages written so far
    pub fn pages_written(&self) -> u32 {
        self.next_sequence
    }
}

/// File name for the page with the given sequence number
pub fn page_file_name(sequence: u32, url: &CanonicalUrl) -> String {
    format!("{:03}_{}.md", sequence, slugify(url))
}

/// Derives a file-name slug from a URL path
///
/// # Examples
///
/// ```
/// use crawldown::output::slugify;
/// use crawldown::url::CanonicalUrl;
///
/// let url = CanonicalUrl::parse("https://docs.example.com/guide/getting-started").unwrap();
/// assert_eq!(slugify(&url), "guide_getting_started");
///
/// let root = CanonicalUrl::parse("https://docs.example.com/").unwrap();
/// assert_eq!(slugify(&root), "index");
/// ```
pub fn slugify(url: &CanonicalUrl) -> String {
    let path = url.path().trim_matches('/');

    let mut slug = String::with_capacity(path.len());
    let mut pending_separator = false;
    for c in path.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    // ASCII only, so byte truncation is safe
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('_');

    if slug.is_empty() {
        "index".to_string()
    } else {
        slug.to_string()
    }
}

/// Renders the full contents of a page file
///
/// If the markdown already opens with a level-1 heading, that heading is
/// kept as the document title.
pub fn render_page(title: Option<&str>, url: &CanonicalUrl, depth: u32, content: &str) -> String {
    let content = content.trim();

    let (heading, body) = match split_leading_h1(content) {
        Some((heading, body)) => (heading.to_string(), body),
        None => {
            let title = title
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| url.to_string());
            (format!("# {}", title), content)
        }
    };

    let mut document = format!("{}\n\nURL: {}\nDepth: {}\n", heading, url, depth);
    if !body.is_empty() {
        document.push('\n');
        document.push_str(body);
        document.push('\n');
    }
    document
}

fn split_leading_h1(content: &str) -> Option<(&str, &str)> {
    let (first, rest) = content.split_once('\n').unwrap_or((content, ""));
    let first = first.trim_end();
    if first.starts_with("# ") && first.len() > 2 {
        Some((first, rest.trim_start()))
    } else {
        None
    }
}
