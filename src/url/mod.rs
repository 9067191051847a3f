//! URL handling module for SEO-Reach
//!
//! This module provides URL normalization, relative link resolution,
//! internal/external classification and file-kind detection. Everything here
//! is a pure function: no I/O, no state.

mod domain;
mod kind;
mod normalize;

use crate::UrlError;
use serde::Serialize;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, site_host};
pub use kind::{file_kind, FileKind};
pub use normalize::{normalize_parsed, normalize_url};

/// Whether a URL belongs to the site under analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkScope {
    /// Same site as the base URL
    Internal,
    /// Any other host
    External,
}

impl LinkScope {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Classifies a URL as internal or external relative to the base URL
///
/// Only the site host takes part in the comparison (see [`site_host`]), so
/// scheme, port, path and query never change the answer. Because of this,
/// classifying a raw URL and its normalized form always agree.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_reach::url::{classify, LinkScope};
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let page = Url::parse("http://WWW.example.com:8080/about").unwrap();
/// let other = Url::parse("https://example.org/").unwrap();
///
/// assert_eq!(classify(&page, &base), LinkScope::Internal);
/// assert_eq!(classify(&other, &base), LinkScope::External);
/// ```
pub fn classify(url: &Url, base_url: &Url) -> LinkScope {
    match (site_host(url), site_host(base_url)) {
        (Some(host), Some(base_host)) if host == base_host => LinkScope::Internal,
        _ => LinkScope::External,
    }
}

/// Resolves an href found on a page against that page's URL, then normalizes it
///
/// Standard relative-reference resolution applies (`../a`, `/b`, `?q=1`,
/// `//host/path`). Absolute hrefs are normalized as-is.
///
/// # Errors
///
/// Returns [`UrlError`] when the href cannot be resolved into an http(s) URL
/// with a host, e.g. `mailto:` or `javascript:` targets.
pub fn resolve_relative(href: &str, page_url: &Url) -> Result<Url, UrlError> {
    let joined = page_url
        .join(href.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(joined)
}
