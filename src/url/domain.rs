use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_reach::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host used to decide whether two URLs belong to the same site
///
/// Hosts are compared case-insensitively and a leading `www.` label is
/// ignored, so `www.example.com` and `example.com` are the same site.
/// Scheme and port never take part in the comparison.
pub fn site_host(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => Some(rest.to_string()),
        _ => Some(host),
    }
}
