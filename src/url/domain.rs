use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the domain from a URL
///
/// The host is lowercased and a leading `www.` is removed, so
/// `https://WWW.Example.com/a` and `http://example.com/b` share one
/// rate-governance key. Ports are not part of the domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemap_scout::url::extract_domain;
///
/// let url = Url::parse("https://www.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://sub.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => host,
        }
    })
}

/// Parses a URL string and returns its normalized domain
///
/// Only `http` and `https` URLs carry a domain; anything else is rejected.
pub fn normalize_domain(url_str: &str) -> UrlResult<String> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    extract_domain(&url)
        .filter(|d| !d.is_empty())
        .ok_or(UrlError::MissingDomain)
}

/// Checks whether two URLs belong to the same normalized domain
pub fn same_domain(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
