//! HTML parser for extracting links and metadata
//!
//! This module handles parsing fetched pages to extract:
//! - Hyperlink targets (from `<a href>` tags)
//! - Page title
//! - The internal link set that feeds the reachability graph

use super::fetcher::FetchResult;
use crate::url::{classify, resolve_relative};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Raw information pulled out of an HTML document
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Hyperlink hrefs in document order, unresolved
    pub hrefs: Vec<String>,
}

/// Internal outgoing links of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinkSet {
    /// The page the links were found on (its final URL)
    pub source: Url,

    /// Normalized internal targets, first-seen order, no duplicates
    pub targets: Vec<Url>,
}

impl PageLinkSet {
    pub fn empty(source: Url) -> Self {
        Self {
            source,
            targets: Vec::new(),
        }
    }
}

/// Everything the audit keeps from one fetched page
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub links: PageLinkSet,
    pub title: Option<String>,
}

/// Parses HTML content and extracts the title and hyperlink hrefs
///
/// # Example
///
/// ```
/// use seo_reach::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.hrefs, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        hrefs: extract_hrefs(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

/// Returns true for hrefs that never name another page
///
/// - empty hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - fragment-only links (same page anchors)
fn is_non_navigational(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return true;
    }

    let lower = href.to_ascii_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Extracts title and internal link set from a fetched page
///
/// Failed fetches and non-HTML content give an empty link set. Hrefs are
/// resolved against the page's final URL, normalized, and kept only when
/// they are internal to `base_url`.
pub fn extract_page(fetch: &FetchResult, base_url: &Url) -> ExtractedPage {
    let source = fetch.final_url.clone();

    let body = match (&fetch.body, fetch.is_html()) {
        (Some(body), true) => body,
        _ => {
            if fetch.is_success() {
                tracing::debug!(
                    "Skipping link extraction for {} (content type {:?})",
                    fetch.url,
                    fetch.content_type
                );
            }
            return ExtractedPage {
                links: PageLinkSet::empty(source),
                title: None,
            };
        }
    };

    let parsed = parse_html(body);
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    let mut unresolved = 0usize;

    for href in &parsed.hrefs {
        if is_non_navigational(href) {
            continue;
        }

        let target = match resolve_relative(href, &source) {
            Ok(target) => target,
            Err(_) => {
                unresolved += 1;
                continue;
            }
        };

        if classify(&target, base_url).is_internal() && seen.insert(target.clone()) {
            targets.push(target);
        }
    }

    if unresolved > 0 {
        tracing::debug!("{} unresolvable links on {}", unresolved, source);
    }

    if parsed.hrefs.is_empty() && !body.trim().is_empty() && parsed.title.is_none() {
        tracing::warn!("No links or title found in HTML from {}", source);
    }

    ExtractedPage {
        links: PageLinkSet { source, targets },
        title: parsed.title,
    }
}

/// Extracts the internal link set of a fetched page
///
/// # Example
///
/// ```
/// use seo_reach::crawler::{extract_internal_links, FetchResult, RawResponse};
/// use std::time::Duration;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/").unwrap();
/// let fetch = FetchResult::from_outcome(
///     page.clone(),
///     Ok(RawResponse {
///         final_url: page.clone(),
///         status: 200,
///         content_type: Some("text/html".to_string()),
///         body: r#"<a href="/about">About</a><a href="https://other.org/">Out</a>"#.to_string(),
///     }),
///     Duration::ZERO,
/// );
///
/// let links = extract_internal_links(&fetch, &page);
/// assert_eq!(links.targets, vec![Url::parse("https://example.com/about").unwrap()]);
/// ```
pub fn extract_internal_links(fetch: &FetchResult, base_url: &Url) -> PageLinkSet {
    extract_page(fetch, base_url).links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchFailure, RawResponse};
    use std::time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn html_fetch(page: &str, body: &str) -> FetchResult {
        FetchResult::from_outcome(
            url(page),
            Ok(RawResponse {
                final_url: url(page),
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: body.to_string(),
            }),
            Duration::ZERO,
        )
    }

    fn targets(page: &str, body: &str) -> Vec<String> {
        extract_internal_links(&html_fetch(page, body), &url("https://example.com/"))
            .targets
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_extract_title() {
        let parsed = parse_html("<html><head><title>Test Page</title></head></html>");
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let parsed = parse_html("<html><head><title>  Spaced  </title></head></html>");
        assert_eq!(parsed.title, Some("Spaced".to_string()));
    }

    #[test]
    fn test_no_title() {
        let parsed = parse_html("<html><head></head><body></body></html>");
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_relative_and_absolute_links() {
        let found = targets(
            "https://example.com/blog/post",
            r#"<a href="/about">a</a>
               <a href="related">b</a>
               <a href="../contact/">c</a>
               <a href="https://example.com/shop">d</a>"#,
        );

        assert_eq!(
            found,
            vec![
                "https://example.com/about",
                "https://example.com/blog/related",
                "https://example.com/contact",
                "https://example.com/shop",
            ]
        );
    }

    #[test]
    fn test_skips_non_navigational_links() {
        let found = targets(
            "https://example.com/",
            r##"<a href="javascript:void(0)">js</a>
               <a href="JavaScript:alert(1)">js2</a>
               <a href="mailto:me@example.com">mail</a>
               <a href="tel:+123">tel</a>
               <a href="data:text/html,hi">data</a>
               <a href="#top">anchor</a>
               <a href="">empty</a>
               <a href="/real">real</a>"##,
        );

        assert_eq!(found, vec!["https://example.com/real"]);
    }

    #[test]
    fn test_drops_external_links() {
        let found = targets(
            "https://example.com/",
            r#"<a href="https://other.org/page">x</a>
               <a href="https://www.example.com/team">y</a>
               <a href="https://blog.example.com/">z</a>"#,
        );

        // www. is the same site, other subdomains are not
        assert_eq!(found, vec!["https://www.example.com/team"]);
    }

    #[test]
    fn test_dedupes_preserving_first_seen_order() {
        let found = targets(
            "https://example.com/",
            r#"<a href="/b">1</a>
               <a href="/a">2</a>
               <a href="/b/">3</a>
               <a href="/a#section">4</a>
               <a href="/a?utm_source=mail">5</a>"#,
        );

        assert_eq!(found, vec!["https://example.com/b", "https://example.com/a"]);
    }

    #[test]
    fn test_follow_nofollow_links() {
        let found = targets(
            "https://example.com/",
            r#"<a href="/page" rel="nofollow">Link</a>"#,
        );
        assert_eq!(found, vec!["https://example.com/page"]);
    }

    #[test]
    fn test_self_links_kept() {
        let found = targets("https://example.com/page", r#"<a href="/page">me</a>"#);
        assert_eq!(found, vec!["https://example.com/page"]);
    }

    #[test]
    fn test_resolves_against_final_url() {
        let fetch = FetchResult::from_outcome(
            url("https://example.com/old"),
            Ok(RawResponse {
                final_url: url("https://example.com/docs/new"),
                status: 200,
                content_type: Some("text/html".to_string()),
                body: r#"<a href="intro">Intro</a>"#.to_string(),
            }),
            Duration::ZERO,
        );

        let links = extract_internal_links(&fetch, &url("https://example.com/"));
        assert_eq!(links.source, url("https://example.com/docs/new"));
        assert_eq!(links.targets, vec![url("https://example.com/docs/intro")]);
    }

    #[test]
    fn test_failed_fetch_gives_empty_set() {
        let fetch = FetchResult::failed(
            url("https://example.com/down"),
            FetchFailure::Timeout,
            Duration::ZERO,
        );
        let links = extract_internal_links(&fetch, &url("https://example.com/"));
        assert_eq!(links.source, url("https://example.com/down"));
        assert!(links.targets.is_empty());
    }

    #[test]
    fn test_non_html_gives_empty_set() {
        let fetch = FetchResult::from_outcome(
            url("https://example.com/feed.json"),
            Ok(RawResponse {
                final_url: url("https://example.com/feed.json"),
                status: 200,
                content_type: Some("application/json".to_string()),
                body: r#"{"href": "/x"}"#.to_string(),
            }),
            Duration::ZERO,
        );
        assert!(extract_internal_links(&fetch, &url("https://example.com/"))
            .targets
            .is_empty());
    }

    #[test]
    fn test_malformed_html_degrades() {
        let page = extract_page(
            &html_fetch("https://example.com/", "<<<not really html <a href='/ok'"),
            &url("https://example.com/"),
        );
        assert!(page.title.is_none());
        assert!(page.links.targets.len() <= 1);
    }

    #[test]
    fn test_extract_page_keeps_title() {
        let page = extract_page(
            &html_fetch(
                "https://example.com/",
                "<html><head><title>Home</title></head><body><a href='/x'>x</a></body></html>",
            ),
            &url("https://example.com/"),
        );
        assert_eq!(page.title.as_deref(), Some("Home"));
        assert_eq!(page.links.targets, vec![url("https://example.com/x")]);
    }
}
