//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from the first request to the files
//! left on disk.

use crawldown::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crawldown::crawler::crawl;
use crawldown::{CrawlError, CrawlMode, CrawlRequest, PageStatus};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing under `root`
fn create_test_config(root: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth: 3,
            max_pages: 50,
            concurrency: 4,
            request_timeout_secs: 5,
            request_delay_ms: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
        },
        output: OutputConfig {
            root_dir: root.to_string_lossy().into_owned(),
        },
    }
}

/// Directory the crawl of `server` writes into
fn domain_dir(root: &Path, server: &MockServer) -> PathBuf {
    let port = server.address().port();
    root.join(format!("127.0.0.1_{}", port))
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_site_crawl() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let root = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <nav><a href="/nav-only">Nav</a></nav>
            <main>
                <h1>Welcome</h1>
                <p>Start with the <a href="/guide">guide</a>.</p>
                <a href="{base_url}/api#overview">API</a>
                <a href="https://elsewhere.example.org/">External</a>
                <a href="mailto:docs@example.com">Mail</a>
            </main>
            </body></html>"#
        ),
    )
    .await;

    mount_page(
        &server,
        "/guide",
        r#"<html><head><title>Guide</title></head><body><main>
            <p>Back <a href="/">home</a>, or see <a href="/guide#install">install</a>.</p>
        </main></body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &server,
        "/api",
        r#"<html><head><title>API [v2]</title></head><body><article>
            <h2>Endpoints</h2><p>Everything.</p>
        </article></body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &server,
        "/nav-only",
        "<html><head><title>Nav</title></head><body><p>Nav page</p></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", base_url), Some(2), Some(50));
    let result = crawl(&request, &config).await.expect("Crawl failed");

    assert_eq!(result.mode, CrawlMode::Site);
    assert_eq!(result.ok_count(), 4);
    assert_eq!(result.failed_count(), 0);

    let output_dir = domain_dir(root.path(), &server);
    assert_eq!(result.output_dir, output_dir);

    // Links are taken from the whole page, navigation included
    let paths: Vec<String> = result
        .ok_records()
        .filter_map(|r| r.relative_path.clone())
        .collect();
    assert_eq!(
        paths,
        vec![
            "pages/000_index.md",
            "pages/001_nav_only.md",
            "pages/002_guide.md",
            "pages/003_api.md",
        ]
    );

    let home = std::fs::read_to_string(output_dir.join("pages/000_index.md")).unwrap();
    assert!(home.starts_with("# Welcome\n\nURL: "));
    assert!(home.contains("Depth: 0\n"));
    assert!(!home.contains("Nav"));

    let index = std::fs::read_to_string(output_dir.join("index.md")).unwrap();
    assert!(index.starts_with(&format!("# Crawl Index: {}/\n", base_url)));
    assert!(index.contains("- Pages: 4 crawled, 0 failed\n"));
    assert!(index.contains("- 002 [Guide](pages/002_guide.md) (depth 1, "));
    assert!(index.contains("- 003 [API \\[v2\\]](pages/003_api.md)"));
    assert!(!index.contains("failed to fetch"));
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Level 0</title></head><body><a href="/level1">Next</a></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/level1",
        r#"<html><head><title>Level 1</title></head><body><a href="/level2">Next</a></body></html>"#
            .to_string(),
    )
    .await;

    // Beyond max depth: must never be requested
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html("<html><body>Too deep</body></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", server.uri()), Some(1), None);
    let result = crawl(&request, &config).await.unwrap();

    assert_eq!(result.ok_count(), 2);
    assert!(result.records.iter().all(|r| r.depth <= 1));
}

#[tokio::test]
async fn test_page_budget() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(
        &server,
        "/",
        format!("<html><head><title>Home</title></head><body>{}</body></html>", links),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/p0"))
        .respond_with(html("<html><head><title>P0</title></head><body>p0</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    for i in 1..10 {
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(html("<html><body>never</body></html>"))
            .expect(0)
            .mount(&server)
            .await;
    }

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", server.uri()), Some(3), Some(2));
    let result = crawl(&request, &config).await.unwrap();

    assert_eq!(result.ok_count(), 2);
}

#[tokio::test]
async fn test_failed_pages_are_counted() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/ok">OK</a>
            <a href="/broken">Broken</a>
            <a href="/manual.pdf">PDF</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/ok",
        "<html><head><title>OK</title></head><body>fine</body></html>".to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", server.uri()), None, None);
    let result = crawl(&request, &config).await.unwrap();

    assert_eq!(result.ok_count(), 2);
    assert_eq!(result.failed_count(), 2);

    let failed: Vec<&str> = result
        .records
        .iter()
        .filter(|r| r.status == PageStatus::Failed)
        .map(|r| r.url.path())
        .collect();
    assert_eq!(failed, vec!["/broken", "/manual.pdf"]);

    let pages_dir = domain_dir(root.path(), &server).join("pages");
    assert_eq!(std::fs::read_dir(pages_dir).unwrap().count(), 2);

    let index = std::fs::read_to_string(result.index_path()).unwrap();
    assert!(index.ends_with("\n2 pages failed to fetch\n"));
}

#[tokio::test]
async fn test_unreachable_start_url() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", server.uri()), None, None);
    let result = crawl(&request, &config).await;

    assert!(matches!(result, Err(CrawlError::StartUrlUnreachable { .. })));
    assert!(!domain_dir(root.path(), &server).join("index.md").exists());
}

#[tokio::test]
async fn test_single_page_mode() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_page(
        &server,
        "/guide/install",
        r#"<html><head><title>Install</title></head><body>
            <main><p>Run it.</p><a href="/guide/next">Next</a></main>
        </body></html>"#
            .to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/guide/next"))
        .respond_with(html("<html><body>next</body></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::page(format!("{}/guide/install", server.uri()));
    let result = crawl(&request, &config).await.unwrap();

    assert_eq!(result.mode, CrawlMode::Page);
    assert_eq!(result.ok_count(), 1);

    let page = domain_dir(root.path(), &server).join("pages/000_guide_install.md");
    let content = std::fs::read_to_string(page).unwrap();
    assert!(content.starts_with("# Install\n"));
    assert!(content.contains("Run it."));

    let index = std::fs::read_to_string(result.index_path()).unwrap();
    assert!(index.contains("- Mode: page\n"));
}

#[tokio::test]
async fn test_single_page_mode_failure_writes_no_index() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::page(format!("{}/missing", server.uri()));
    let result = crawl(&request, &config).await;

    assert!(matches!(result, Err(CrawlError::StartUrlUnreachable { .. })));
    assert!(!domain_dir(root.path(), &server).exists());
}

#[tokio::test]
async fn test_recrawl_clears_previous_output() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        "<html><head><title>Home</title></head><body>home</body></html>".to_string(),
    )
    .await;

    let stale_dir = domain_dir(root.path(), &server).join("pages");
    std::fs::create_dir_all(&stale_dir).unwrap();
    std::fs::write(stale_dir.join("007_old_page.md"), "stale").unwrap();

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", server.uri()), None, None);
    crawl(&request, &config).await.unwrap();

    let mut files: Vec<String> = std::fs::read_dir(&stale_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["000_index.md"]);
}

#[tokio::test]
async fn test_redirect_target_fetched_once() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/old">Old</a>
            <a href="/new">New</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<html><head><title>New</title></head><body>new</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", server.uri()), None, None);
    let result = crawl(&request, &config).await.unwrap();

    let paths: Vec<String> = result
        .ok_records()
        .filter_map(|r| r.relative_path.clone())
        .collect();
    assert_eq!(paths, vec!["pages/000_index.md", "pages/001_new.md"]);
    assert_eq!(result.failed_count(), 0);
}

#[tokio::test]
async fn test_trailing_slash_redirect_is_followed() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/guide">Guide</a></body></html>"#
            .to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/guide/"))
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/guide/",
        "<html><head><title>Guide</title></head><body>guide</body></html>".to_string(),
    )
    .await;

    let config = create_test_config(root.path());
    let request = CrawlRequest::site(format!("{}/", server.uri()), None, None);
    let result = crawl(&request, &config).await.unwrap();

    assert_eq!(result.ok_count(), 2);
    let guide = domain_dir(root.path(), &server).join("pages/001_guide.md");
    assert!(std::fs::read_to_string(guide).unwrap().starts_with("# Guide\n"));
}

#[tokio::test]
async fn test_invalid_start_url() {
    let root = TempDir::new().unwrap();
    let config = create_test_config(root.path());

    let request = CrawlRequest::site("not a url", None, None);
    let result = crawl(&request, &config).await;

    assert!(matches!(result, Err(CrawlError::InvalidStartUrl(_))));
}
