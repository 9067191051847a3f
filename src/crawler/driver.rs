//! Breadth-first site crawl
//!
//! Starting from the seed, each depth level is fetched as one batch through a
//! [`PageSource`]; internal links found on that level form the next one.

use super::fetcher::FetchBatch;
use super::parser::{extract_page, ExtractedPage};
use super::PageSource;
use crate::config::CrawlerConfig;
use crate::url::{classify, file_kind};
use crate::ReachError;
use std::collections::HashSet;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How far the crawl may go
#[derive(Debug, Clone, Copy)]
pub struct CrawlLimits {
    /// Deepest link level fetched; 0 fetches only the seed
    pub max_depth: u32,
    /// Total number of URLs the crawl may request
    pub max_pages: usize,
}

impl CrawlLimits {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_pages: config.max_pages as usize,
        }
    }
}

/// What a crawl produced
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Every fetch issued, keyed by requested URL
    pub fetches: FetchBatch,
    /// Extracted links and titles, one per fetched page, in crawl order
    pub pages: Vec<ExtractedPage>,
    /// Internal URLs discovered but not fetched because the page limit was hit
    pub unvisited: Vec<Url>,
    /// Depth levels actually fetched
    pub levels: u32,
}

impl CrawlOutcome {
    pub fn was_cancelled(&self) -> bool {
        self.fetches.was_cancelled()
    }
}

/// Crawls the site breadth-first from `seed`
///
/// Static assets (images, stylesheets, scripts, PDFs) are never queued.
/// A URL is requested at most once; redirect destinations count as visited.
/// Pages reached through a redirect to another site are neither kept nor
/// followed.
/// Cancellation stops the crawl after the running batch returns.
pub async fn crawl_site<S: PageSource>(
    source: &S,
    seed: &Url,
    limits: &CrawlLimits,
    cancel: &CancellationToken,
) -> Result<CrawlOutcome, ReachError> {
    let started = Instant::now();
    let mut outcome = CrawlOutcome::default();
    let mut seen: HashSet<Url> = HashSet::from([seed.clone()]);
    let mut level = vec![seed.clone()];

    tracing::info!(
        "Starting crawl from {} (max depth {}, max pages {})",
        seed,
        limits.max_depth,
        limits.max_pages
    );

    for depth in 0..=limits.max_depth {
        if level.is_empty() || cancel.is_cancelled() {
            break;
        }

        let budget = limits.max_pages.saturating_sub(outcome.fetches.len());
        if budget == 0 {
            tracing::info!("Page limit of {} reached", limits.max_pages);
            outcome.unvisited.append(&mut level);
            break;
        }
        if level.len() > budget {
            outcome.unvisited.extend(level.drain(budget..));
        }

        tracing::info!("Crawling depth {} ({} URLs)", depth, level.len());
        let batch = source.fetch_batch(level.clone(), cancel).await?;
        let cancelled = batch.was_cancelled();
        let mut next_level = Vec::new();

        for url in &level {
            let Some(result) = batch.get(url) else {
                continue;
            };

            if let Some(destination) = result.redirected_to() {
                seen.insert(destination.clone());
                if !classify(destination, seed).is_internal() {
                    tracing::debug!("{} redirects off-site to {}", url, destination);
                    continue;
                }
            }

            let page = extract_page(result, seed);

            if depth < limits.max_depth {
                for target in &page.links.targets {
                    if file_kind(target).is_asset() {
                        continue;
                    }
                    if seen.insert(target.clone()) {
                        next_level.push(target.clone());
                    }
                }
            }

            if result.is_success() {
                outcome.pages.push(page);
            }
        }

        outcome.fetches.merge(batch);
        outcome.levels = depth + 1;

        if cancelled {
            tracing::warn!("Crawl cancelled at depth {}", depth);
            break;
        }

        level = next_level;
    }

    tracing::info!(
        "Crawl finished: {} URLs fetched over {} levels in {:?}",
        outcome.fetches.len(),
        outcome.levels,
        started.elapsed()
    );

    Ok(outcome)
}
