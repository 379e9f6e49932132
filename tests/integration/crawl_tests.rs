//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from configuration to stored bundle.

use docbundle::config::parse_config;
use docbundle::crawler::{run_crawl, Coordinator};
use docbundle::site::{site_from_config, Site};
use docbundle::storage::{DocStorer, FileSystemStore, Manifest};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a site from a single `[[doc]]` table appended to a minimal config
fn site_for(base_url: &str, extra: &str) -> Site {
    let config = parse_config(&format!(
        r#"
[output]
directory = "./unused"

[[doc]]
name = "Mock Docs"
slug = "mock"
version = "1.0"
base-url = "{}"

[doc.options]
retry-delay-ms = 10

[doc.extractor]
kind = "heading"
entry-type = "Guide"
{}
"#,
        base_url, extra
    ))
    .expect("Failed to parse config");
    site_from_config(&config.docs[0]).expect("Failed to build site")
}

/// HTML response; `set_body_string` would override the content type with `text/plain`
fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>T</title></head><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

#[tokio::test]
async fn test_full_crawl_writes_bundle() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/docs/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html(&format!(
            r#"<nav class="sidebar"><a href="secret.html">hidden</a></nav>
            <main>
              <h1>Home</h1>
              <a href="guide/intro.html">Intro</a>
              <a href="{}guide/setup.html#install">Setup</a>
              <a href="missing.html">Missing</a>
              <a href="manual.pdf">PDF</a>
              <a href="https://other.example.com/docs/">Elsewhere</a>
              <a href="{}/blog/">Blog</a>
            </main>"#,
            base_url,
            mock_server.uri()
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide/intro.html"))
        .respond_with(html(r#"<main><h1>Introduction ¶</h1><a href="setup.html">next</a></main>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide/setup.html"))
        .respond_with(html(r#"<main><h1>Setup</h1><script>track()</script></main>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/manual.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let site = site_for(
        &base_url,
        r#"
[[doc.filters]]
kind = "keep-only"
selector = "main"

[[doc.filters]]
kind = "remove"
selector = "script"
"#,
    );

    let dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(dir.path());
    let coordinator = Coordinator::new(site).expect("Failed to create coordinator");
    let report = DocStorer::store(coordinator, &store, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_written, 3);
    assert_eq!(report.entries, 2);
    assert_eq!(report.stats.skipped, 2, "404 and PDF are skipped");
    assert_eq!(report.stats.frontier_remaining, 0);

    let bundle = dir.path().join("mock~1.0");
    let setup = std::fs::read_to_string(bundle.join("guide/setup.html")).unwrap();
    assert!(setup.contains("<h1>Setup</h1>"));
    assert!(!setup.contains("script"));
    assert!(!bundle.join("secret.html").exists());

    let index: serde_json::Value =
        serde_json::from_slice(&std::fs::read(bundle.join("index.json")).unwrap()).unwrap();
    let names: Vec<&str> = index["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Introduction", "Setup"]);
    assert_eq!(index["types"][0]["name"], "Guide");
    assert_eq!(index["types"][0]["count"], 2);

    let manifest = Manifest::load(&store).await.unwrap();
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.docs()[0]["slug"], "mock");
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/docs/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html("<h1>Home</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = run_crawl(site_for(&base_url, "")).await.expect("Crawl failed");

    assert_eq!(output.stats.pages_emitted, 1);
    assert!(output.pages.get("index").is_some());
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/docs/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let site = site_for(&base_url, "").with_options(
        docbundle::ScraperOptions::default()
            .with_retry_count(1)
            .with_retry_delay(std::time::Duration::from_millis(5)),
    );
    let output = run_crawl(site).await.expect("Crawl failed");

    assert!(output.stats.produced_nothing());
    assert_eq!(output.stats.skipped, 1);
}

#[tokio::test]
async fn test_headers_and_params_are_sent() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/docs/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .and(header("x-api-key", "secret"))
        .and(query_param("lang", "en"))
        .respond_with(html("<h1>Home</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let site = site_for(
        &base_url,
        r#"
[doc.source]
headers = { "X-Api-Key" = "secret" }
params = { lang = "en" }
"#,
    );
    let output = run_crawl(site).await.expect("Crawl failed");

    assert_eq!(output.stats.pages_emitted, 1);
}

#[tokio::test]
async fn test_redirect_outside_base_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/docs/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html(r#"<h1>Home</h1><a href="old.html">old</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/old.html"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/archive/old.html", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/archive/old.html"))
        .respond_with(html("<h1>Archived</h1>"))
        .mount(&mock_server)
        .await;

    let output = run_crawl(site_for(&base_url, "")).await.expect("Crawl failed");

    assert_eq!(output.stats.pages_emitted, 1);
    assert_eq!(output.stats.skipped, 1);
    assert!(output.index.is_empty());
}

#[tokio::test]
async fn test_local_mirror_crawl() {
    let mirror = TempDir::new().unwrap();
    std::fs::write(
        mirror.path().join("index.html"),
        r#"<h1>Home</h1><a href="api/">API</a><a href="gone.html">gone</a>"#,
    )
    .unwrap();
    std::fs::create_dir(mirror.path().join("api")).unwrap();
    std::fs::write(mirror.path().join("api/index.html"), "<h1>API Reference</h1>").unwrap();

    let site = site_for(
        "https://docs.example.com/",
        &format!(
            "[doc.source]\nkind = \"local\"\ndirectory = '{}'\n",
            mirror.path().display()
        ),
    );
    let output = run_crawl(site).await.expect("Crawl failed");

    assert_eq!(output.stats.pages_emitted, 2);
    assert_eq!(output.stats.skipped, 1);
    assert!(output.pages.paths().any(|path| path.starts_with("api")));
    assert_eq!(output.index.len(), 1);
}

#[tokio::test]
async fn test_missing_local_mirror_is_setup_error() {
    let site = site_for(
        "https://docs.example.com/",
        "[doc.source]\nkind = \"local\"\ndirectory = '/nonexistent/docbundle-mirror'\n",
    );
    let result = run_crawl(site).await;
    assert!(matches!(result, Err(docbundle::DocsError::Setup(_))));
}
