//! HTML parser for extracting links and page descriptions
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - The page description (standard or Open Graph meta tag)
//! - Sitemap links offered by directory listings
//!
//! `scraper::Html` is not `Send`, so everything here is synchronous and
//! returns owned data that async callers can carry across awaits.

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page description, whitespace collapsed but not truncated
    pub description: Option<String>,

    /// All links found on the page (absolute URLs, fragments removed)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// # Example
///
/// ```
/// use sitemap_scout::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><meta name="description" content="About us"></head>
///               <body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.description.as_deref(), Some("About us"));
/// assert_eq!(parsed.links, vec!["https://example.com/page"]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        description: extract_description(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts only the description of an HTML page
pub fn extract_meta_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    extract_description(&document)
}

/// Finds `<meta name="description">`, then `<meta property="og:description">`
fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[content]").ok()?;

    let mut open_graph = None;
    for element in document.select(&selector) {
        let meta = element.value();
        let content = match meta.attr("content").map(collapse_whitespace) {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };

        let name = meta.attr("name").unwrap_or("");
        let property = meta.attr("property").unwrap_or("");

        if name.eq_ignore_ascii_case("description") {
            return Some(content);
        }
        if open_graph.is_none() && property.eq_ignore_ascii_case("og:description") {
            open_graph = Some(content);
        }
    }

    open_graph
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Collects `.xml` anchors that mention "sitemap" in their href or text
///
/// Used on HTML directory listings served at well-known sitemap paths.
pub fn extract_sitemap_anchors(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let text = element.text().collect::<String>().to_ascii_lowercase();
            let href_lower = href.to_ascii_lowercase();
            let path = href_lower.split(['?', '#']).next().unwrap_or("");
            let is_xml = path.ends_with(".xml") || path.ends_with(".xml.gz");
            if is_xml && (href_lower.contains("sitemap") || text.contains("sitemap")) {
                resolve_link(href, base_url)
            } else {
                None
            }
        })
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

/// Shortens a description to at most `max_chars` characters
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
