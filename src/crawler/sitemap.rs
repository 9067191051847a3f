//! XML sitemap expansion
//!
//! Reads `<urlset>` sitemaps and follows `<sitemapindex>` files a bounded
//! number of levels deep. Page URLs found this way join the set of known
//! site URLs, which is how orphan pages get discovered.

use super::PageSource;
use crate::url::{classify, normalize_url};
use crate::ReachError;
use quick_xml::de::from_str;
use quick_xml::errors::serialize::DeError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How many levels of sitemap index files are followed
pub const MAX_SITEMAP_NESTING: usize = 3;

#[derive(Debug, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    entries: Vec<LocEntry>,
}

#[derive(Debug, Deserialize)]
struct SitemapIndex {
    #[serde(rename = "sitemap", default)]
    entries: Vec<LocEntry>,
}

#[derive(Debug, Deserialize)]
struct LocEntry {
    #[serde(default)]
    loc: Option<String>,
}

fn locations(entries: Vec<LocEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| entry.loc)
        .map(|loc| loc.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// A parsed sitemap file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: locations of further sitemaps
    Index(Vec<String>),
}

/// Parses sitemap XML
///
/// # Example
///
/// ```
/// use seo_reach::crawler::{parse_sitemap, SitemapDocument};
///
/// let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/about</loc></url>
/// </urlset>"#;
///
/// assert_eq!(
///     parse_sitemap(xml).unwrap(),
///     SitemapDocument::UrlSet(vec!["https://example.com/about".to_string()])
/// );
/// ```
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, DeError> {
    match root_element(xml)?.as_deref() {
        Some("sitemapindex") => {
            let index: SitemapIndex = from_str(xml)?;
            Ok(SitemapDocument::Index(locations(index.entries)))
        }
        Some("urlset") => {
            let set: UrlSet = from_str(xml)?;
            Ok(SitemapDocument::UrlSet(locations(set.entries)))
        }
        Some(other) => Err(DeError::Custom(format!(
            "unexpected root element <{}>",
            other
        ))),
        None => Err(DeError::Custom("no root element".to_string())),
    }
}

/// Local name of the first element, namespace prefix dropped
fn root_element(xml: &str) -> Result<Option<String>, DeError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(Some(
                    String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                ));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// What sitemap expansion found
#[derive(Debug, Default)]
pub struct SitemapExpansion {
    /// Normalized internal page URLs, first-seen order, no duplicates
    pub pages: Vec<Url>,
    /// Sitemap files read successfully
    pub sitemaps_read: usize,
    /// Sitemap files that could not be fetched or parsed, with the reason
    pub failures: Vec<(Url, String)>,
}

/// Fetches the given sitemaps, follows index files and collects page URLs
///
/// Only URLs internal to `base_url` are kept. A sitemap that fails to load
/// or parse is recorded and skipped.
pub async fn collect_sitemap_urls<S: PageSource>(
    source: &S,
    sitemaps: &[Url],
    base_url: &Url,
    cancel: &CancellationToken,
) -> Result<SitemapExpansion, ReachError> {
    let mut expansion = SitemapExpansion::default();
    let mut visited: HashSet<Url> = HashSet::new();
    let mut seen_pages: HashSet<Url> = HashSet::new();
    let mut level: Vec<Url> = sitemaps
        .iter()
        .filter(|u| visited.insert((*u).clone()))
        .cloned()
        .collect();

    for nesting in 0..=MAX_SITEMAP_NESTING {
        if level.is_empty() || cancel.is_cancelled() {
            break;
        }

        tracing::info!("Reading {} sitemaps (level {})", level.len(), nesting);
        let batch = source.fetch_batch(level.clone(), cancel).await?;
        let mut next_level = Vec::new();

        for sitemap_url in &level {
            let Some(result) = batch.get(sitemap_url) else {
                continue;
            };

            let body = match (&result.body, &result.failure) {
                (Some(body), None) => body,
                (_, failure) => {
                    let reason = failure
                        .map(|f| f.to_string())
                        .unwrap_or_else(|| "empty response".to_string());
                    tracing::warn!("Failed to fetch sitemap {}: {}", sitemap_url, reason);
                    expansion.failures.push((sitemap_url.clone(), reason));
                    continue;
                }
            };

            let document = match parse_sitemap(body) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Failed to parse sitemap {}: {}", sitemap_url, e);
                    expansion
                        .failures
                        .push((sitemap_url.clone(), format!("parse error: {}", e)));
                    continue;
                }
            };

            expansion.sitemaps_read += 1;

            match document {
                SitemapDocument::UrlSet(locs) => {
                    let before = expansion.pages.len();
                    for loc in locs {
                        match normalize_url(&loc) {
                            Ok(page) if classify(&page, base_url).is_internal() => {
                                if seen_pages.insert(page.clone()) {
                                    expansion.pages.push(page);
                                }
                            }
                            Ok(page) => tracing::debug!("Ignoring external sitemap URL {}", page),
                            Err(e) => tracing::debug!("Ignoring sitemap entry {}: {}", loc, e),
                        }
                    }
                    tracing::debug!(
                        "{} new URLs from {}",
                        expansion.pages.len() - before,
                        sitemap_url
                    );
                }
                SitemapDocument::Index(locs) => {
                    if nesting == MAX_SITEMAP_NESTING {
                        tracing::warn!(
                            "Sitemap index {} exceeds nesting limit of {}, not followed",
                            sitemap_url,
                            MAX_SITEMAP_NESTING
                        );
                        continue;
                    }
                    for loc in locs {
                        match normalize_url(&loc) {
                            Ok(child) if visited.insert(child.clone()) => next_level.push(child),
                            Ok(_) => {}
                            Err(e) => tracing::debug!("Ignoring sitemap index entry {}: {}", loc, e),
                        }
                    }
                }
            }
        }

        if batch.was_cancelled() {
            break;
        }

        level = next_level;
    }

    tracing::info!(
        "Sitemaps listed {} internal URLs ({} files read, {} failed)",
        expansion.pages.len(),
        expansion.sitemaps_read,
        expansion.failures.len()
    );

    Ok(expansion)
}
