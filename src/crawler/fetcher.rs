//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the audit, including:
//! - Building HTTP clients with the configured user agent
//! - The [`Transport`] seam one GET goes through
//! - Bounded-concurrency batch fetching with per-request timeouts
//! - Cancellation of a running batch
//! - Error classification into [`FetchFailure`]

use crate::url::normalize_parsed;
use futures::stream::{self, StreamExt};
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Maximum redirect hops followed before giving up on a URL
pub const MAX_REDIRECTS: usize = 10;

/// Why a URL produced no usable content
///
/// Failures are data recorded in a [`FetchResult`], never errors raised to
/// the caller. The `Display` text is the classification shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailure {
    #[error("timeout")]
    Timeout,

    #[error("dns failure")]
    Dns,

    #[error("connection error")]
    Connect,

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("malformed response")]
    MalformedResponse,

    #[error("request error")]
    Request,
}

/// What a transport hands back for a single GET that got a response
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL the response came from, after redirects
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    /// Body text; empty when the status was not a success
    pub body: String,
}

/// Outcome of fetching one requested URL
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: Url,

    /// Final URL after redirects; equals `url` when no response arrived
    pub final_url: Url,

    /// HTTP status code, if a response arrived
    pub status: Option<u16>,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page body, present only on success
    pub body: Option<String>,

    /// Wall time spent on the request
    pub elapsed: Duration,

    /// Set when the fetch did not succeed
    pub failure: Option<FetchFailure>,
}

impl FetchResult {
    /// Builds a result from a transport outcome
    ///
    /// Non-2xx responses become [`FetchFailure::HttpStatus`] failures but keep
    /// their status, content type and final URL.
    pub fn from_outcome(
        url: Url,
        outcome: Result<RawResponse, FetchFailure>,
        elapsed: Duration,
    ) -> Self {
        match outcome {
            Ok(response) => {
                let final_url = normalize_parsed(response.final_url.clone())
                    .unwrap_or(response.final_url);
                let success = (200..300).contains(&response.status);

                Self {
                    url,
                    final_url,
                    status: Some(response.status),
                    content_type: response.content_type,
                    body: success.then_some(response.body),
                    elapsed,
                    failure: (!success).then_some(FetchFailure::HttpStatus(response.status)),
                }
            }
            Err(failure) => Self::failed(url, failure, elapsed),
        }
    }

    /// Builds a failed result for a URL that produced no response
    pub fn failed(url: Url, failure: FetchFailure, elapsed: Duration) -> Self {
        Self {
            final_url: url.clone(),
            url,
            status: None,
            content_type: None,
            body: None,
            elapsed,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Returns true if the response carries HTML
    ///
    /// A missing Content-Type header counts as HTML; plenty of small sites
    /// never send one.
    pub fn is_html(&self) -> bool {
        if !self.is_success() {
            return false;
        }

        match &self.content_type {
            None => true,
            Some(content_type) => {
                let mime = content_type
                    .split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_ascii_lowercase();
                mime == "text/html" || mime == "application/xhtml+xml"
            }
        }
    }

    /// Returns the destination when the request was redirected
    pub fn redirected_to(&self) -> Option<&Url> {
        (self.final_url != self.url).then_some(&self.final_url)
    }
}

/// Results of one batch, keyed by requested URL
#[derive(Debug, Default)]
pub struct FetchBatch {
    results: HashMap<Url, FetchResult>,
    cancelled: bool,
}

impl FetchBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            results: HashMap::with_capacity(capacity),
            cancelled: false,
        }
    }

    /// Records a result; each URL's slot is written once
    pub(crate) fn insert(&mut self, result: FetchResult) {
        self.results.entry(result.url.clone()).or_insert(result);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn get(&self, url: &Url) -> Option<&FetchResult> {
        self.results.get(url)
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.results.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True if the batch stopped early because it was cancelled
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn iter(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.values()
    }

    /// Requested URLs, in no particular order
    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.results.keys()
    }

    /// Failed results sorted by URL
    pub fn failures(&self) -> Vec<&FetchResult> {
        let mut failures: Vec<_> = self.results.values().filter(|r| !r.is_success()).collect();
        failures.sort_by(|a, b| a.url.cmp(&b.url));
        failures
    }

    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    /// Requested URL to final URL, for every redirected request
    pub fn redirects(&self) -> HashMap<Url, Url> {
        self.results
            .values()
            .filter_map(|r| r.redirected_to().map(|to| (r.url.clone(), to.clone())))
            .collect()
    }

    /// Folds another batch into this one; existing entries win
    pub fn merge(&mut self, other: FetchBatch) {
        self.cancelled |= other.cancelled;
        for (url, result) in other.results {
            self.results.entry(url).or_insert(result);
        }
    }

    pub fn into_results(self) -> HashMap<Url, FetchResult> {
        self.results
    }
}

/// Settings shared by every fetch path
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Ceiling on requests in flight at once
    pub max_concurrency: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl FetchSettings {
    pub fn new(max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &crate::config::CrawlerConfig) -> Self {
        Self::new(config.max_concurrency as usize, config.request_timeout())
    }
}

/// A single HTTP GET, abstracted so batches can run over any client
pub trait Transport: Sync {
    /// Fetches one URL, following redirects
    ///
    /// Implementations should honour `timeout`; [`fetch_all`] enforces it
    /// regardless.
    fn fetch_page(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawResponse, FetchFailure>> + Send;
}

impl Transport for Client {
    fn fetch_page(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawResponse, FetchFailure>> + Send {
        let request = self.get(url.clone()).timeout(timeout);

        async move {
            let response = request
                .send()
                .await
                .map_err(|e| classify_reqwest_error(&e))?;

            let final_url = response.url().clone();
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = if status.is_success() {
                response
                    .text()
                    .await
                    .map_err(|e| classify_reqwest_error(&e))?
            } else {
                String::new()
            };

            Ok(RawResponse {
                final_url,
                status: status.as_u16(),
                content_type,
                body,
            })
        }
    }
}

/// Builds an async HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use seo_reach::crawler::build_http_client;
///
/// let client = build_http_client("SEO-Analysis-Tool-Crawler/1.0").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Categorizes a `reqwest::Error` into a [`FetchFailure`]
pub(crate) fn classify_reqwest_error(error: &reqwest::Error) -> FetchFailure {
    if let Some(status) = error.status() {
        return FetchFailure::HttpStatus(status.as_u16());
    }

    if error.is_redirect() {
        FetchFailure::TooManyRedirects
    } else if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_connect() {
        if is_dns_error(error) {
            FetchFailure::Dns
        } else {
            FetchFailure::Connect
        }
    } else if error.is_body() || error.is_decode() {
        FetchFailure::MalformedResponse
    } else {
        FetchFailure::Request
    }
}

/// Walks the source chain looking for a resolver failure
fn is_dns_error(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let message = err.to_string().to_ascii_lowercase();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        current = err.source();
    }
    false
}

/// Drops repeated URLs while keeping first-seen order
pub(crate) fn dedup_urls<I: IntoIterator<Item = Url>>(urls: I) -> Vec<Url> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Fetches every URL with at most `settings.max_concurrency` requests in flight
///
/// # Guarantees
///
/// - Every distinct input URL ends up with exactly one [`FetchResult`] unless
///   the batch is cancelled.
/// - A request running past `settings.timeout` is recorded as
///   [`FetchFailure::Timeout`] without holding up the others.
/// - Failures are recorded, never returned as errors.
/// - On cancellation, finished results are kept, in-flight requests are
///   dropped and queued ones are never sent; [`FetchBatch::was_cancelled`]
///   reports it.
///
/// No retries are attempted.
pub async fn fetch_all<T, I>(
    transport: &T,
    urls: I,
    settings: &FetchSettings,
    cancel: &CancellationToken,
) -> FetchBatch
where
    T: Transport,
    I: IntoIterator<Item = Url>,
{
    let urls = dedup_urls(urls);
    let total = urls.len();
    let timeout = settings.timeout;
    let started = Instant::now();

    tracing::debug!(
        "Fetching {} URLs with up to {} in flight",
        total,
        settings.max_concurrency
    );

    let mut pending = stream::iter(urls)
        .map(|url| async move {
            let request_started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, transport.fetch_page(&url, timeout)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchFailure::Timeout),
            };
            FetchResult::from_outcome(url, outcome, request_started.elapsed())
        })
        .buffer_unordered(settings.max_concurrency.max(1));

    let mut batch = FetchBatch::with_capacity(total);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                batch.mark_cancelled();
                tracing::warn!(
                    "Fetch batch cancelled after {} of {} URLs",
                    batch.len(),
                    total
                );
                break;
            }

            next = pending.next() => match next {
                Some(result) => {
                    match &result.failure {
                        None => tracing::debug!(
                            "Loaded {} (status {:?}) in {:?}",
                            result.url,
                            result.status,
                            result.elapsed
                        ),
                        Some(failure) => tracing::debug!("Failed {}: {}", result.url, failure),
                    }
                    batch.insert(result);
                }
                None => break,
            },
        }
    }

    tracing::info!(
        "Fetched {} URLs ({} ok, {} failed) in {:?}",
        batch.len(),
        batch.success_count(),
        batch.len() - batch.success_count(),
        started.elapsed()
    );

    batch
}
