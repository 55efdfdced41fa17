//! HTML-to-markdown conversion

/// Tags dropped entirely (with their contents) during conversion
const SKIP_TAGS: &[&str] = &["script", "style", "nav", "noscript", "iframe", "svg"];

/// Longest run of blank lines kept outside code fences
const MAX_BLANK_LINES: usize = 2;

/// Markers that open and close a fenced code block
const FENCE_MARKERS: [&str; 2] = ["```", "~~~"];

/// Converts an HTML fragment to markdown
///
/// Outside fenced code blocks, runs of more than two blank lines are
/// shortened and trailing whitespace is trimmed, except for the two spaces
/// that mark a hard line break. Fenced blocks are left exactly as converted.
pub fn html_to_markdown(html: &str) -> Result<String, std::io::Error> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let raw = converter.convert(html)?;
    Ok(tidy(&raw))
}

fn tidy(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut fence: Option<&str> = None;
    let mut blank_run = 0;

    for line in markdown.lines() {
        if let Some(marker) = fence {
            out.push('\n');
            out.push_str(line);
            if line.trim_start().starts_with(marker) {
                fence = None;
            }
            continue;
        }

        let line = trim_line_end(line);
        if line.is_empty() {
            blank_run += 1;
            continue;
        }

        if !out.is_empty() {
            out.push('\n');
            for _ in 0..blank_run.min(MAX_BLANK_LINES) {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line);
        fence = fence_marker(line);
    }

    out
}

/// Returns the marker if `line` opens a fenced code block
fn fence_marker(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    FENCE_MARKERS.into_iter().find(|marker| line.starts_with(marker))
}

/// Trims trailing whitespace, keeping a two-space hard break
fn trim_line_end(line: &str) -> &str {
    let trimmed = line.trim_end();
    if !trimmed.is_empty() && line[trimmed.len()..].starts_with("  ") {
        &line[..trimmed.len() + 2]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_paragraphs() {
        let markdown = html_to_markdown("<h2>Install</h2><p>Run the installer.</p>").unwrap();
        assert!(markdown.contains("## Install"));
        assert!(markdown.contains("Run the installer."));
    }

    #[test]
    fn test_skipped_tags_removed() {
        let html = r#"
            <div>
                <nav><a href="/">Home</a></nav>
                <script>var x = 1;</script>
                <style>p { color: red; }</style>
                <p>Visible</p>
            </div>
        "#;
        let markdown = html_to_markdown(html).unwrap();
        assert!(markdown.contains("Visible"));
        assert!(!markdown.contains("Home"));
        assert!(!markdown.contains("var x"));
        assert!(!markdown.contains("color: red"));
    }

    #[test]
    fn test_links_kept() {
        let markdown =
            html_to_markdown(r#"<p>See <a href="https://example.com/api">the API</a></p>"#).unwrap();
        assert!(markdown.contains("[the API](https://example.com/api)"));
    }

    #[test]
    fn test_code_block_blank_lines_kept() {
        let html = "<pre><code>fn a() {}\n\n\n\nfn b() {}</code></pre><p>after</p>";
        let markdown = html_to_markdown(html).unwrap();
        assert!(markdown.contains("fn a() {}\n\n\n\nfn b() {}"));
        assert!(markdown.contains("after"));
    }

    #[test]
    fn test_line_break_kept() {
        let markdown = html_to_markdown("<p>line one<br>line two</p>").unwrap();
        assert!(markdown.contains("line one  \nline two"));
    }

    #[test]
    fn test_tidy_shortens_blank_runs() {
        assert_eq!(tidy("a \n\n\n\n\nb\n\n"), "a\n\n\nb");
        assert_eq!(tidy("a\n\nb"), "a\n\nb");
        assert_eq!(tidy("\n\n# Title\nline\n"), "# Title\nline");
        assert_eq!(tidy(""), "");
    }

    #[test]
    fn test_tidy_leaves_fenced_blocks_alone() {
        let markdown = "text\n```py\ndef a():\n    pass\n\n\n\ndef b():   \n```\n\n\n\n\nafter";
        assert_eq!(
            tidy(markdown),
            "text\n```py\ndef a():\n    pass\n\n\n\ndef b():   \n```\n\n\nafter"
        );

        let tilde = "~~~\nx\n\n\n\ny\n~~~";
        assert_eq!(tidy(tilde), tilde);
    }

    #[test]
    fn test_tidy_keeps_hard_breaks() {
        assert_eq!(tidy("one  \ntwo\t \nthree   \nfour"), "one  \ntwo\nthree  \nfour");
    }
}
