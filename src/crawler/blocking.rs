//! Thread-pool fetch path
//!
//! Used when the async client cannot be built or the configuration asks for
//! it. Requests run on a handful of scoped OS threads with a blocking
//! client; the result contract is the same as [`fetch_all`](super::fetch_all).

use super::fetcher::{
    classify_reqwest_error, dedup_urls, FetchBatch, FetchFailure, FetchResult, FetchSettings,
    RawResponse, MAX_REDIRECTS,
};
use reqwest::blocking::Client;
use reqwest::{header::CONTENT_TYPE, redirect::Policy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Upper bound on worker threads, whatever the configured concurrency
pub const MAX_BLOCKING_WORKERS: usize = 4;

/// A single blocking HTTP GET
pub trait BlockingTransport: Sync {
    fn fetch_page(&self, url: &Url, timeout: Duration) -> Result<RawResponse, FetchFailure>;
}

impl BlockingTransport for Client {
    fn fetch_page(&self, url: &Url, timeout: Duration) -> Result<RawResponse, FetchFailure> {
        let response = self
            .get(url.clone())
            .timeout(timeout)
            .send()
            .map_err(|e| classify_reqwest_error(&e))?;

        let final_url = response.url().clone();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = if status.is_success() {
            response.text().map_err(|e| classify_reqwest_error(&e))?
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

/// Builds a blocking HTTP client
///
/// The client owns its own runtime thread, so it must be built, used and
/// dropped outside of async code (see [`BlockingSource`](super::BlockingSource)).
pub fn build_blocking_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches every URL on a small pool of worker threads
///
/// Workers pull the next URL off a shared index, so at most
/// `min(settings.max_concurrency, MAX_BLOCKING_WORKERS)` requests run at
/// once. A request that comes back after `settings.timeout` is recorded as
/// [`FetchFailure::Timeout`]. Cancellation stops workers from starting new
/// requests and discards responses that arrive after it.
///
/// A blocking request cannot be interrupted: a worker busy when the token
/// fires only notices once its request returns, which takes at most
/// `settings.timeout`. The batch therefore returns up to one timeout after
/// cancellation, with those late responses dropped.
pub fn fetch_all_blocking<T, I>(
    transport: &T,
    urls: I,
    settings: &FetchSettings,
    cancel: &CancellationToken,
) -> FetchBatch
where
    T: BlockingTransport,
    I: IntoIterator<Item = Url>,
{
    let urls = dedup_urls(urls);
    let total = urls.len();
    let timeout = settings.timeout;
    let workers = settings
        .max_concurrency
        .clamp(1, MAX_BLOCKING_WORKERS)
        .min(total.max(1));
    let started = Instant::now();

    tracing::debug!("Fetching {} URLs on {} worker threads", total, workers);

    let next_index = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let next_index = &next_index;
            let urls = &urls;

            scope.spawn(move || loop {
                if cancel.is_cancelled() {
                    break;
                }

                let index = next_index.fetch_add(1, Ordering::Relaxed);
                let Some(url) = urls.get(index) else {
                    break;
                };

                let request_started = Instant::now();
                let mut outcome = transport.fetch_page(url, timeout);
                let elapsed = request_started.elapsed();

                if elapsed > timeout && outcome.is_ok() {
                    outcome = Err(FetchFailure::Timeout);
                }

                if cancel.is_cancelled() {
                    break;
                }

                if sender
                    .send(FetchResult::from_outcome(url.clone(), outcome, elapsed))
                    .is_err()
                {
                    break;
                }
            });
        }
    });

    drop(sender);

    let mut batch = FetchBatch::with_capacity(total);
    for result in receiver {
        batch.insert(result);
    }

    if cancel.is_cancelled() {
        batch.mark_cancelled();
        tracing::warn!(
            "Blocking fetch cancelled after {} of {} URLs",
            batch.len(),
            total
        );
    }

    tracing::info!(
        "Fetched {} URLs ({} ok, {} failed) in {:?} on the blocking path",
        batch.len(),
        batch.success_count(),
        batch.len() - batch.success_count(),
        started.elapsed()
    );

    batch
}
