//! End-to-end audits of a mock site

use seo_reach::config::parse_config;
use seo_reach::crawler::{run_audit, AuditOutcome, FetchFailure};
use seo_reach::output::{build_summary, write_reports};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, p: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html"),
        )
        .mount(server)
        .await;
}

/// Home -> page1 -> page3, home -> page2 (404), orphan only in the sitemap
async fn mount_site(server: &MockServer) {
    let base = server.uri();

    mount_html(
        server,
        "/",
        r#"<html><head><title>Home</title></head><body>
           <a href="/page1">Page 1</a>
           <a href="page2">Page 2</a>
           <a href="/logo.png">Logo</a>
           </body></html>"#,
    )
    .await;
    mount_html(
        server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body>
           <a href="/page3">Page 3</a>
           <a href="https://external.example.org/">Elsewhere</a>
           </body></html>"#,
    )
    .await;
    mount_html(server, "/page3", "<html><head><title>Page 3</title></head></html>").await;
    mount_html(
        server,
        "/orphan",
        "<html><head><title>Lonely</title></head><body><a href='/page1'>1</a></body></html>",
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/</loc></url>
  <url><loc>{base}/page1</loc></url>
  <url><loc>{base}/orphan</loc></url>
</urlset>"#
                )
                .into_bytes(),
                "application/xml",
            ),
        )
        .mount(server)
        .await;
}

fn config_toml(server: &MockServer, dir: &Path, transport: &str) -> String {
    let base = server.uri();
    format!(
        r#"
[site]
base-url = "{base}/"
sitemaps = ["{base}/sitemap.xml"]

[crawler]
max-depth = 3
max-pages = 50
max-concurrency = 4
request-timeout-secs = 5
transport = "{transport}"

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"

[output]
report-path = "{report}"
json-path = "{json}"
"#,
        report = dir.join("report.md").display(),
        json = dir.join("report.json").display(),
    )
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

fn assert_site_reachability(server: &MockServer, outcome: &AuditOutcome) {
    let report = &outcome.report;

    assert_eq!(report.root, url(server, "/"));
    assert_eq!(report.click_depth(&url(server, "/")), Some(0));
    assert_eq!(report.click_depth(&url(server, "/page1")), Some(1));
    assert_eq!(report.click_depth(&url(server, "/page2")), Some(1));
    assert_eq!(report.click_depth(&url(server, "/page3")), Some(2));
    assert!(report.is_orphan(&url(server, "/orphan")));
    assert_eq!(report.orphans.len(), 1);

    assert_eq!(
        outcome.fetches.get(&url(server, "/page2")).unwrap().failure,
        Some(FetchFailure::HttpStatus(404))
    );
    assert!(!outcome.fetches.contains(&url(server, "/logo.png")));
    assert!(!outcome.cancelled);
}

#[tokio::test]
async fn test_full_audit_concurrent() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = parse_config(&config_toml(&server, dir.path(), "concurrent")).unwrap();
    let outcome = run_audit(config, CancellationToken::new()).await.unwrap();

    assert_site_reachability(&server, &outcome);
    assert_eq!(outcome.sitemap.pages.len(), 3);
    assert_eq!(
        outcome.titles.get(&url(&server, "/orphan")).map(String::as_str),
        Some("Lonely")
    );
}

#[tokio::test]
async fn test_full_audit_blocking() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = parse_config(&config_toml(&server, dir.path(), "blocking")).unwrap();
    let outcome = run_audit(config, CancellationToken::new()).await.unwrap();

    assert_site_reachability(&server, &outcome);
}

#[tokio::test]
async fn test_audit_reports_written() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = parse_config(&config_toml(&server, dir.path(), "concurrent")).unwrap();
    let report_path = dir.path().join("report.md");
    let json_path = dir.path().join("report.json");

    let outcome = run_audit(config, CancellationToken::new()).await.unwrap();
    let summary = build_summary(&outcome, Some("test-hash"));
    write_reports(&summary, &report_path, Some(&json_path)).unwrap();

    let markdown = std::fs::read_to_string(&report_path).unwrap();
    assert!(markdown.contains("# SEO Reachability Report"));
    assert!(markdown.contains("## Orphan Pages"));
    assert!(markdown.contains(&format!("- {}/orphan", server.uri())));
    assert!(markdown.contains("HTTP 404"));
    assert!(markdown.contains("- **Config Hash**: test-hash"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["orphan_urls"], 1);
    assert_eq!(json["reachable_urls"], 4);
    assert_eq!(json["fetch_failures"], 1);
}

#[tokio::test]
async fn test_audit_cancelled_up_front() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = parse_config(&config_toml(&server, dir.path(), "concurrent")).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = run_audit(config, cancel).await.unwrap();

    assert!(outcome.cancelled);
    assert!(outcome.fetches.is_empty());
    assert_eq!(outcome.report.root, url(&server, "/"));
}
