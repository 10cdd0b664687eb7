//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use async_trait::async_trait;
use catalog_sweep::config::{
    Config, ConverterConfig, CrawlerConfig, ExportFormat, FetcherConfig, OutputConfig,
    SelectorConfig,
};
use catalog_sweep::crawler::{Coordinator, FetchFailure, FetchedPage, HttpFetcher, PageFetcher};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(seeds: Vec<String>, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            seeds,
            allowed_domains: vec![],
            max_depth: 3,
            max_page: 5,
            max_concurrent_pages_open: 1,
            visited_set: false,
        },
        fetcher: FetcherConfig {
            minimum_time_on_page: 0,
            retry_times: 1,
            retry_delay: 1,
            request_timeout: 5,
            depth_limit: 3,
            ..FetcherConfig::default()
        },
        output: OutputConfig {
            directory: dir.join("outputs").display().to_string(),
            json_feed_directory: dir.join("data").display().to_string(),
            format: ExportFormat::Csv,
            ..OutputConfig::default()
        },
        converter: ConverterConfig::default(),
        selectors: SelectorConfig::default(),
    }
}

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

fn listing(heading: &str, products: &[&str], next: Option<&str>) -> String {
    let items: String = products
        .iter()
        .map(|href| format!(r#"<div class="product-item"><a href="{}">Item</a></div>"#, href))
        .collect();
    let pagination = next
        .map(|href| format!(r#"<div class="pagination"><a class="next" href="{}">Next</a></div>"#, href))
        .unwrap_or_default();
    format!(
        "<html><body><h1>{}</h1>{}{}</body></html>",
        heading, items, pagination
    )
}

fn product(name: &str, price: &str) -> String {
    format!(
        r#"<html><body><h1>{}</h1><div class="price">{}</div></body></html>"#,
        name, price
    )
}

#[tokio::test]
async fn test_full_crawl_deduplicates_across_branches() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    serve(
        &server,
        "/catalogue/",
        r#"<div class="subcategories">
            <a href="/catalogue/alpha/">Alpha</a>
            <a href="/catalogue/beta/">Beta</a>
        </div>"#,
    )
    .await;
    serve(
        &server,
        "/catalogue/alpha/",
        &listing(
            "Alpha",
            &["/catalogue/alpha/p1/", "/catalogue/shared/"],
            Some("/catalogue/alpha/page-2/"),
        ),
    )
    .await;
    serve(
        &server,
        "/catalogue/alpha/page-2/",
        &listing("Alpha", &["/catalogue/shared/"], None),
    )
    .await;
    serve(
        &server,
        "/catalogue/beta/",
        &listing(
            "Beta",
            &["/catalogue/shared/", "/catalogue/beta/p3/"],
            Some("/catalogue/beta/page-2/"),
        ),
    )
    .await;
    serve(
        &server,
        "/catalogue/beta/page-2/",
        &listing("Beta", &["/catalogue/beta/p3/"], None),
    )
    .await;
    serve(&server, "/catalogue/alpha/p1/", &product("First", "990 ₽")).await;
    serve(&server, "/catalogue/shared/", &product("Shared", "1 234,50 ₽")).await;
    serve(&server, "/catalogue/beta/p3/", &product("Third", "15")).await;

    let config = create_test_config(vec![format!("{}/catalogue/", server.uri())], dir.path());
    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator
        .run_until(std::future::pending())
        .await
        .expect("crawl should finish");

    assert_eq!(stats.categories.dispatched, 3);
    assert_eq!(stats.pagination.dispatched, 2);
    assert_eq!(stats.products.dispatched, 6);
    assert_eq!(stats.total_failed(), 0);
    assert_eq!(stats.records_kept, 3);
    assert_eq!(stats.duplicates_discarded, 3);
    assert!(!stats.interrupted);

    let artifact = stats.artifact.expect("an export should be written");
    let mut reader = csv::Reader::from_path(&artifact).unwrap();
    assert_eq!(reader.records().count(), 3);

    let feed = stats.json_feed.expect("a JSON feed should be written");
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(feed).unwrap()).unwrap();
    assert_eq!(records.len(), 3);

    let shared = records
        .iter()
        .find(|r| r["url"].as_str().unwrap().ends_with("/catalogue/shared/"))
        .expect("shared product is exported");
    assert_eq!(shared["categories"], serde_json::json!(["Alpha"]));
    assert_eq!(shared["name"], "Shared");
    assert_eq!(shared["price"], "1234.50");
}

#[tokio::test]
async fn test_http_fetcher_retries_configured_codes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    serve(&server, "/flaky", "<h1>ok</h1>").await;

    let config = FetcherConfig {
        minimum_time_on_page: 0,
        retry_times: 2,
        retry_delay: 1,
        ..FetcherConfig::default()
    };
    let fetcher = HttpFetcher::new(config, 2).unwrap();
    let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();

    let page = fetcher.fetch(&url, 1).await.expect("retry should succeed");
    assert_eq!(page.body, "<h1>ok</h1>");
}

#[tokio::test]
async fn test_http_fetcher_does_not_retry_other_codes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetcherConfig {
        minimum_time_on_page: 0,
        retry_times: 3,
        retry_delay: 1,
        ..FetcherConfig::default()
    };
    let fetcher = HttpFetcher::new(config, 2).unwrap();
    let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();

    let failure = fetcher.fetch(&url, 1).await.unwrap_err();
    assert_eq!(failure.reason, "HTTP 404");
    assert_eq!(failure.url, url);
}

/// Serves canned pages and records every request with its depth
struct RecordingFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl RecordingFetcher {
    fn new(pages: Vec<(String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<(String, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for RecordingFetcher {
    async fn fetch(&self, url: &Url, depth: u32) -> Result<FetchedPage, FetchFailure> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), depth));
        self.pages
            .get(url.as_str())
            .map(|body| FetchedPage {
                final_url: url.clone(),
                body: body.clone(),
            })
            .ok_or_else(|| FetchFailure::new(url, "HTTP 404"))
    }
}

fn cycle_pages() -> Vec<(String, String)> {
    let link = |href: &str| format!(r#"<h1>Section</h1><div class="subcategories"><a href="{}">Next</a></div>"#, href);
    vec![
        ("https://shop.com/".to_string(), link("/a/")),
        ("https://shop.com/a/".to_string(), link("/b/")),
        ("https://shop.com/b/".to_string(), link("/a/")),
    ]
}

#[tokio::test]
async fn test_category_cycle_is_bounded_by_depth() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(RecordingFetcher::new(cycle_pages()));
    let config = create_test_config(vec!["https://shop.com/".to_string()], dir.path());

    let mut coordinator = Coordinator::with_fetcher(config, fetcher.clone()).unwrap();
    let stats = coordinator.run_until(std::future::pending()).await.unwrap();

    let requests = fetcher.requests();
    assert!(requests.iter().all(|(_, depth)| *depth <= 3));
    assert_eq!(
        requests,
        vec![
            ("https://shop.com/".to_string(), 0),
            ("https://shop.com/a/".to_string(), 1),
            ("https://shop.com/b/".to_string(), 2),
            ("https://shop.com/a/".to_string(), 3),
        ]
    );
    assert_eq!(stats.categories.dispatched, 4);
    assert_eq!(stats.records_kept, 0);
}

#[tokio::test]
async fn test_visited_set_breaks_category_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(RecordingFetcher::new(cycle_pages()));
    let mut config = create_test_config(vec!["https://shop.com/".to_string()], dir.path());
    config.crawler.visited_set = true;

    let mut coordinator = Coordinator::with_fetcher(config, fetcher.clone()).unwrap();
    let stats = coordinator.run_until(std::future::pending()).await.unwrap();

    assert_eq!(fetcher.requests().len(), 3);
    assert_eq!(stats.revisits_skipped, 1);
}

#[tokio::test]
async fn test_failed_product_pages_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![
        (
            "https://shop.com/".to_string(),
            r#"<div class="subcategories"><a href="/catalogue/oils/">Oils</a></div>"#.to_string(),
        ),
        (
            "https://shop.com/catalogue/oils/".to_string(),
            listing(
                "Oils",
                &["/catalogue/oils/gone/", "/catalogue/oils/ok/"],
                None,
            ),
        ),
        (
            "https://shop.com/catalogue/oils/ok/".to_string(),
            product("Motor oil", "1 500 руб."),
        ),
    ];
    let fetcher = Arc::new(RecordingFetcher::new(pages));
    let mut config = create_test_config(vec!["https://shop.com/".to_string()], dir.path());
    config.crawler.max_concurrent_pages_open = 4;

    let mut coordinator = Coordinator::with_fetcher(config, fetcher).unwrap();
    let stats = coordinator.run_until(std::future::pending()).await.unwrap();

    assert_eq!(stats.products.dispatched, 2);
    assert_eq!(stats.products.failed, 1);
    assert_eq!(stats.products.succeeded, 1);
    assert_eq!(stats.records_kept, 1);
    assert_eq!(stats.categories.dispatched, 2);

    let records = coordinator.aggregator().snapshot();
    assert!(records.is_empty(), "the store is handed to the export");
}
