//! Crawler module for page fetching and link discovery
//!
//! This module contains the fetch and discovery side of an audit, including:
//! - Bounded-concurrency HTTP fetching, async and thread-pool flavours
//! - HTML parsing and internal link extraction
//! - Breadth-first site crawling and sitemap expansion
//! - Overall audit coordination

mod blocking;
mod coordinator;
mod driver;
mod fetcher;
mod parser;
mod sitemap;

pub use blocking::{build_blocking_client, fetch_all_blocking, BlockingTransport, MAX_BLOCKING_WORKERS};
pub use coordinator::{run_audit, AuditOutcome, Coordinator};
pub use driver::{crawl_site, CrawlLimits, CrawlOutcome};
pub use fetcher::{
    build_http_client, fetch_all, FetchBatch, FetchFailure, FetchResult, FetchSettings,
    RawResponse, Transport, MAX_REDIRECTS,
};
pub use parser::{extract_internal_links, extract_page, parse_html, ExtractedPage, PageLinkSet, ParsedPage};
pub use sitemap::{
    collect_sitemap_urls, parse_sitemap, SitemapDocument, SitemapExpansion, MAX_SITEMAP_NESTING,
};

use crate::ReachError;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Something that can fetch a batch of URLs
///
/// The crawl driver and sitemap expansion only talk to this trait, so they
/// run the same way over the async and the thread-pool fetch paths.
pub trait PageSource: Sync {
    fn fetch_batch(
        &self,
        urls: Vec<Url>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<FetchBatch, ReachError>> + Send;
}

/// Batches run through [`fetch_all`] on the current runtime
pub struct ConcurrentSource<T> {
    transport: T,
    settings: FetchSettings,
}

impl<T: Transport> ConcurrentSource<T> {
    pub fn new(transport: T, settings: FetchSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }
}

impl<T: Transport> PageSource for ConcurrentSource<T> {
    fn fetch_batch(
        &self,
        urls: Vec<Url>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<FetchBatch, ReachError>> + Send {
        async move { Ok(fetch_all(&self.transport, urls, &self.settings, cancel).await) }
    }
}

/// Batches run through [`fetch_all_blocking`] on tokio's blocking pool
///
/// A fresh blocking client is built inside each blocking task, because a
/// `reqwest::blocking::Client` may not be created or dropped on an async
/// worker thread.
pub struct BlockingSource {
    user_agent: String,
    settings: FetchSettings,
}

impl BlockingSource {
    pub fn new(user_agent: impl Into<String>, settings: FetchSettings) -> Self {
        Self {
            user_agent: user_agent.into(),
            settings,
        }
    }
}

impl PageSource for BlockingSource {
    fn fetch_batch(
        &self,
        urls: Vec<Url>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<FetchBatch, ReachError>> + Send {
        let user_agent = self.user_agent.clone();
        let settings = self.settings.clone();
        let cancel = cancel.clone();

        async move {
            tokio::task::spawn_blocking(move || -> Result<FetchBatch, ReachError> {
                let client = build_blocking_client(&user_agent)?;
                Ok(fetch_all_blocking(&client, urls, &settings, &cancel))
            })
            .await?
        }
    }
}

/// The HTTP-backed source picked from configuration at runtime
pub enum HttpSource {
    Concurrent(ConcurrentSource<reqwest::Client>),
    Blocking(BlockingSource),
}

impl HttpSource {
    /// Builds the configured fetch path
    ///
    /// Falls back to the thread-pool path if the async client cannot be built.
    pub fn from_config(config: &crate::config::Config) -> Self {
        let user_agent = config.user_agent.header_value();
        let settings = FetchSettings::from_config(&config.crawler);

        match config.crawler.transport {
            crate::config::TransportMode::Blocking => {
                tracing::info!("Using blocking fetch path");
                Self::Blocking(BlockingSource::new(user_agent, settings))
            }
            crate::config::TransportMode::Concurrent => match build_http_client(&user_agent) {
                Ok(client) => Self::Concurrent(ConcurrentSource::new(client, settings)),
                Err(e) => {
                    tracing::warn!(
                        "Async HTTP client unavailable ({}), falling back to blocking fetch path",
                        e
                    );
                    Self::Blocking(BlockingSource::new(user_agent, settings))
                }
            },
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking(_))
    }
}

impl PageSource for HttpSource {
    fn fetch_batch(
        &self,
        urls: Vec<Url>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<FetchBatch, ReachError>> + Send {
        async move {
            match self {
                Self::Concurrent(source) => source.fetch_batch(urls, cancel).await,
                Self::Blocking(source) => source.fetch_batch(urls, cancel).await,
            }
        }
    }
}


/// Normalized string form used as a lookup key in tests
#[cfg(test)]
fn url_key(raw: &str) -> String {
    crate::url::normalize_url(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}
