//! Batch fetching against a mock server, async and blocking clients

use seo_reach::crawler::{
    build_blocking_client, build_http_client, fetch_all, fetch_all_blocking, FetchFailure,
    FetchSettings,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><a href='/about'>About</a></html>".as_bytes().to_vec(),
                "text/html; charset=utf-8",
            ),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><title>About</title></html>".as_bytes().to_vec(), "text/html"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/about"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(1_500)),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

/// A localhost URL nothing is listening on
fn closed_port_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap()
}

#[tokio::test]
async fn test_fetch_all_classifies_outcomes() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let client = build_http_client("TestBot/1.0.0").unwrap();
    let refused = closed_port_url();
    let urls = vec![
        page(&server, "/"),
        page(&server, "/about"),
        page(&server, "/old"),
        page(&server, "/slow"),
        page(&server, "/error"),
        page(&server, "/missing"),
        refused.clone(),
    ];

    let batch = fetch_all(
        &client,
        urls.clone(),
        &FetchSettings::new(4, Duration::from_millis(500)),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(batch.len(), urls.len());

    let home = batch.get(&page(&server, "/")).unwrap();
    assert!(home.is_success());
    assert!(home.is_html());
    assert_eq!(home.status, Some(200));
    assert_eq!(home.content_type.as_deref(), Some("text/html; charset=utf-8"));
    assert!(home.body.as_deref().unwrap_or("").contains("/about"));

    let redirected = batch.get(&page(&server, "/old")).unwrap();
    assert!(redirected.is_success());
    assert_eq!(redirected.final_url, page(&server, "/about"));
    assert_eq!(
        batch.redirects().get(&page(&server, "/old")),
        Some(&page(&server, "/about"))
    );

    assert_eq!(
        batch.get(&page(&server, "/slow")).unwrap().failure,
        Some(FetchFailure::Timeout)
    );
    assert_eq!(
        batch.get(&page(&server, "/error")).unwrap().failure,
        Some(FetchFailure::HttpStatus(503))
    );
    assert_eq!(
        batch.get(&page(&server, "/missing")).unwrap().failure,
        Some(FetchFailure::HttpStatus(404))
    );
    assert_eq!(
        batch.get(&refused).unwrap().failure,
        Some(FetchFailure::Connect)
    );
}

#[tokio::test]
async fn test_fetch_all_blocking_matches_async_results() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let urls = vec![
        page(&server, "/"),
        page(&server, "/old"),
        page(&server, "/slow"),
        page(&server, "/missing"),
    ];

    // The blocking client must live entirely off the async runtime
    let batch = tokio::task::spawn_blocking(move || {
        let client = build_blocking_client("TestBot/1.0.0").unwrap();
        fetch_all_blocking(
            &client,
            urls,
            &FetchSettings::new(2, Duration::from_millis(500)),
            &CancellationToken::new(),
        )
    })
    .await
    .unwrap();

    assert_eq!(batch.len(), 4);
    assert!(batch.get(&page(&server, "/")).unwrap().is_success());
    assert_eq!(
        batch.get(&page(&server, "/old")).unwrap().final_url,
        page(&server, "/about")
    );
    assert_eq!(
        batch.get(&page(&server, "/slow")).unwrap().failure,
        Some(FetchFailure::Timeout)
    );
    assert_eq!(
        batch.get(&page(&server, "/missing")).unwrap().failure,
        Some(FetchFailure::HttpStatus(404))
    );
}

#[tokio::test]
async fn test_fetch_all_cancellation_with_real_client() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let client = build_http_client("TestBot/1.0.0").unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let batch = fetch_all(
        &client,
        vec![page(&server, "/"), page(&server, "/slow")],
        &FetchSettings::new(2, Duration::from_secs(10)),
        &cancel,
    )
    .await;

    assert!(batch.was_cancelled());
    assert!(batch.get(&page(&server, "/")).unwrap().is_success());
    assert!(!batch.contains(&page(&server, "/slow")));
}
