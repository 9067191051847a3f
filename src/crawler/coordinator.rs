//! Audit coordinator - main orchestration logic
//!
//! This module runs one audit end to end:
//! - Crawling the site from the base URL
//! - Expanding configured sitemaps and extra URLs into the known-URL set
//! - Fetching listed pages the crawl never reached
//! - Building the link graph and analyzing reachability from the home page

use super::driver::{crawl_site, CrawlLimits};
use super::fetcher::FetchBatch;
use super::parser::extract_page;
use super::sitemap::{collect_sitemap_urls, SitemapExpansion};
use super::{HttpSource, PageSource};
use crate::config::Config;
use crate::graph::{analyze, GraphBuilder, ReachabilityGraph, ReachabilityReport};
use crate::url::{classify, file_kind, normalize_url};
use crate::ReachError;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Everything one audit produced
#[derive(Debug)]
pub struct AuditOutcome {
    /// Normalized base URL from the configuration
    pub base_url: Url,
    pub graph: ReachabilityGraph,
    pub report: ReachabilityReport,
    /// Every fetch issued, keyed by requested URL
    pub fetches: FetchBatch,
    /// Page titles keyed by final URL
    pub titles: HashMap<Url, String>,
    pub sitemap: SitemapExpansion,
    /// Depth levels the crawl fetched
    pub crawl_levels: u32,
    /// URLs left unfetched because of the page limit
    pub unvisited: usize,
    /// True if the audit was cut short; the report covers what was fetched
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Main audit coordinator structure
pub struct Coordinator<S> {
    config: Config,
    source: S,
    base_url: Url,
    cancel: CancellationToken,
}

impl Coordinator<HttpSource> {
    /// Creates a coordinator fetching over HTTP as configured
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self, ReachError> {
        let source = HttpSource::from_config(&config);
        Self::with_source(config, source, cancel)
    }
}

impl<S: PageSource> Coordinator<S> {
    /// Creates a coordinator over any page source
    pub fn with_source(
        config: Config,
        source: S,
        cancel: CancellationToken,
    ) -> Result<Self, ReachError> {
        let base_url = normalize_url(&config.site.base_url)?;
        Ok(Self {
            config,
            source,
            base_url,
            cancel,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Runs the audit
    ///
    /// Fetch problems never fail the audit; they end up in
    /// [`AuditOutcome::fetches`]. Cancellation skips the remaining fetch
    /// stages and analyzes whatever was collected.
    pub async fn run(&self) -> Result<AuditOutcome, ReachError> {
        let started_at = Utc::now();
        tracing::info!("Starting audit of {}", self.base_url);

        let limits = CrawlLimits::from_config(&self.config.crawler);
        let crawl = crawl_site(&self.source, &self.base_url, &limits, &self.cancel).await?;
        let crawl_levels = crawl.levels;
        let unvisited = crawl.unvisited.len();
        let mut fetches = crawl.fetches;
        let mut pages = crawl.pages;

        // Sitemaps may live on another host; listed pages may not
        let sitemap_urls = self.configured_urls(&self.config.site.sitemaps, false);
        let sitemap = if sitemap_urls.is_empty() || self.cancel.is_cancelled() {
            SitemapExpansion::default()
        } else {
            collect_sitemap_urls(&self.source, &sitemap_urls, &self.base_url, &self.cancel).await?
        };

        let extra_urls = self.configured_urls(&self.config.site.extra_urls, true);

        // Listed pages the crawl never reached still get their links counted
        let visited: HashSet<&Url> = fetches
            .iter()
            .flat_map(|r| [&r.url, &r.final_url])
            .collect();
        let mut queued = HashSet::new();
        let pending: Vec<Url> = sitemap
            .pages
            .iter()
            .chain(extra_urls.iter())
            .filter(|u| !visited.contains(u) && !file_kind(u).is_asset())
            .filter(|u| queued.insert((*u).clone()))
            .cloned()
            .collect();

        if !pending.is_empty() && !self.cancel.is_cancelled() {
            tracing::info!("Fetching {} listed URLs not reached by the crawl", pending.len());
            let batch = self.source.fetch_batch(pending.clone(), &self.cancel).await?;
            for url in &pending {
                if let Some(result) = batch
                    .get(url)
                    .filter(|r| r.is_success() && self.is_on_site(&r.final_url))
                {
                    pages.push(extract_page(result, &self.base_url));
                }
            }
            fetches.merge(batch);
        }

        let known: Vec<Url> = std::iter::once(self.base_url.clone())
            .chain(fetches.urls().cloned())
            .chain(sitemap.pages.iter().cloned())
            .chain(extra_urls.iter().cloned())
            .collect();

        let titles: HashMap<Url, String> = pages
            .iter()
            .filter_map(|p| p.title.clone().map(|t| (p.links.source.clone(), t)))
            .collect();

        // The graph covers pages; links to images, scripts and the like are left out
        let link_sets = pages.into_iter().map(|page| {
            let mut links = page.links;
            links.targets.retain(|target| !file_kind(target).is_asset());
            links
        });

        // A redirect off the site leaves the requested URL as a dead end
        let redirects = fetches
            .redirects()
            .into_iter()
            .filter(|(_, to)| self.is_on_site(to));

        let graph = GraphBuilder::new()
            .redirects(redirects)
            .known_urls(known)
            .link_sets(link_sets)
            .build();

        let root = resolve_home(&graph, &self.base_url, &fetches);
        let report = analyze(&graph, &root)?;

        let cancelled = fetches.was_cancelled() || self.cancel.is_cancelled();
        if cancelled {
            tracing::warn!("Audit was cancelled; results cover fetched pages only");
        }

        tracing::info!(
            "Audit finished: {} known URLs, {} reachable, {} orphans",
            report.total_urls(),
            report.reachable.len(),
            report.orphans.len()
        );

        Ok(AuditOutcome {
            base_url: self.base_url.clone(),
            graph,
            report,
            fetches,
            titles,
            sitemap,
            crawl_levels,
            unvisited,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn is_on_site(&self, url: &Url) -> bool {
        classify(url, &self.base_url).is_internal()
    }

    /// Normalizes configured URLs, optionally dropping other sites' URLs
    fn configured_urls(&self, raw: &[String], internal_only: bool) -> Vec<Url> {
        raw.iter()
            .filter_map(|s| match normalize_url(s) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Skipping configured URL '{}': {}", s, e);
                    None
                }
            })
            .filter(|url| {
                let keep = !internal_only || self.is_on_site(url);
                if !keep {
                    tracing::warn!("Skipping {}: not on {}", url, self.base_url);
                }
                keep
            })
            .collect()
    }
}

/// Candidate home page URLs, in order of preference
fn home_candidates(base_url: &Url) -> Vec<Url> {
    let mut candidates = vec![base_url.clone()];
    let dir = base_url.path().trim_end_matches('/').to_string();

    for index in ["index.html", "index.php"] {
        let mut candidate = base_url.clone();
        candidate.set_path(&format!("{}/{}", dir, index));
        candidates.push(candidate);
    }

    candidates
}

/// Picks the reachability root
///
/// The base URL wins when it loaded; otherwise the first `index.html` /
/// `index.php` variant that is in the graph and loaded. Falls back to the
/// base URL.
fn resolve_home(graph: &ReachabilityGraph, base_url: &Url, fetches: &FetchBatch) -> Url {
    let loaded = |url: &Url| fetches.get(url).map(|r| r.is_success()).unwrap_or(false);

    home_candidates(base_url)
        .into_iter()
        .find(|candidate| graph.contains(candidate) && loaded(candidate))
        .inspect(|home| {
            if home != base_url {
                tracing::info!("Using {} as home page", home);
            }
        })
        .unwrap_or_else(|| base_url.clone())
}

/// Runs a complete audit over HTTP
///
/// This is the main entry point. It will:
/// 1. Build the configured fetch path
/// 2. Crawl the site and expand sitemaps
/// 3. Build the link graph
/// 4. Analyze reachability from the home page
pub async fn run_audit(
    config: Config,
    cancel: CancellationToken,
) -> Result<AuditOutcome, ReachError> {
    let coordinator = Coordinator::new(config, cancel)?;
    coordinator.run().await
}
