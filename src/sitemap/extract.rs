//! Extraction strategies for sitemap documents
//!
//! Leaf documents go through a chain that degrades gracefully:
//! 1. Structured: a real XML walk collecting `<url>` entries with their
//!    optional `lastmod`, `changefreq` and `priority`
//! 2. Bare tags: every `<loc>` value, for documents the XML reader rejects
//! 3. Heuristic: absolute URLs found line by line or by pattern, for
//!    plain-text sitemaps and badly broken XML
//!
//! All functions here are pure; fetching lives in the parser.

use crate::output::SitemapUrlRecord;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Extensions of files that are never pages
const ASSET_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "avif", "css", "js", "mjs", "map",
    "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "webm", "avi", "mov", "zip",
];

/// Extensions of sitemap files themselves
const SITEMAP_EXTENSIONS: &[&str] = &["xml", "gz", "txt"];

/// Namespace and schema hosts that show up in sitemap headers
const SCHEMA_MARKERS: &[&str] = &["sitemaps.org/schemas", "w3.org/", "google.com/schemas"];

fn loc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?loc\s*>\s*(?:<!\[CDATA\[)?\s*(.*?)\s*(?:\]\]>)?\s*</(?:[a-z0-9_-]+:)?loc\s*>")
            .expect("loc regex is valid")
    })
}

fn absolute_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"'{}|\\^`]+"#).expect("url regex is valid"))
}

fn sitemap_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)https?://[^\s<>"']+?\.xml(?:\.gz)?\b"#).expect("sitemap url regex is valid")
    })
}

fn index_root_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<(?:[a-z0-9_-]+:)?sitemapindex[\s>]").expect("index regex is valid"))
}

fn urlset_root_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<(?:[a-z0-9_-]+:)?urlset[\s>]").expect("urlset regex is valid"))
}

/// Checks whether a body looks like a sitemap document
pub fn has_sitemap_signature(text: &str) -> bool {
    let head: String = text.chars().take(4096).collect::<String>().to_ascii_lowercase();
    head.contains("<urlset")
        || head.contains("<sitemapindex")
        || head.contains("<?xml")
        || head.contains("<loc>")
        || index_root_regex().is_match(&head)
        || urlset_root_regex().is_match(&head)
}

/// Classifies a document as a sitemap index
///
/// An index root element decides it. Without one, a `<urlset>` root makes
/// it a leaf, and otherwise a path naming an index (`sitemap_index.xml`,
/// `sitemap-index.xml.gz`, ...) does.
pub fn is_index_document(url: &str, text: &str) -> bool {
    if index_root_regex().is_match(text) {
        return true;
    }
    if urlset_root_regex().is_match(text) {
        return false;
    }

    let path = url.split(['?', '#']).next().unwrap_or("").to_ascii_lowercase();
    let file = path.rsplit('/').next().unwrap_or("");
    file.contains("sitemap") && file.contains("index")
}

/// Extracts child sitemap URLs from an index document
///
/// Falls back to absolute `.xml` URLs when no location tags are found.
pub fn extract_child_sitemaps(text: &str) -> Vec<String> {
    let structured = walk_entries(text, "sitemap")
        .map(|entries| entries.into_iter().map(|e| e.loc).collect::<Vec<_>>())
        .unwrap_or_default();
    if !structured.is_empty() {
        return dedup(structured);
    }

    let bare = bare_locs(text);
    if !bare.is_empty() {
        return bare;
    }

    find_sitemap_urls(text)
}

/// Absolute `.xml` and `.xml.gz` URLs embedded anywhere in the text
pub fn find_sitemap_urls(text: &str) -> Vec<String> {
    dedup(
        sitemap_url_regex()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .filter(|u| !is_schema_url(u))
            .collect(),
    )
}

/// Checks for a sitemap root element, the stricter test used on error pages
pub fn has_sitemap_root(text: &str) -> bool {
    index_root_regex().is_match(text) || urlset_root_regex().is_match(text)
}

/// Runs the leaf extraction chain and returns the first non-empty result
pub fn extract_leaf_entries(text: &str) -> Vec<SitemapUrlRecord> {
    match extract_entries_structured(text) {
        Ok(entries) if !entries.is_empty() => return entries,
        Ok(_) => {}
        Err(e) => tracing::debug!("Structured sitemap parse failed: {}", e),
    }

    let bare = extract_bare_locs(text);
    if !bare.is_empty() {
        tracing::debug!("Recovered {} entries from bare <loc> tags", bare.len());
        return bare;
    }

    let heuristic = extract_heuristic(text);
    if !heuristic.is_empty() {
        tracing::debug!("Recovered {} entries heuristically", heuristic.len());
    }
    heuristic
}

/// Structured extraction of `<url>` entries
///
/// Namespace prefixes are ignored. Only `loc` elements whose parent is a
/// `url` count, so nested `image:loc` or `video:loc` never become entries.
pub fn extract_entries_structured(text: &str) -> Result<Vec<SitemapUrlRecord>, quick_xml::Error> {
    let entries = walk_entries(text, "url")?;
    let mut seen = HashSet::new();
    Ok(entries
        .into_iter()
        .filter(|e| seen.insert(e.loc.clone()))
        .collect())
}

/// Every `<loc>` value, regardless of structure
pub fn extract_bare_locs(text: &str) -> Vec<SitemapUrlRecord> {
    bare_locs(text)
        .into_iter()
        .map(SitemapUrlRecord::new)
        .collect()
}

/// Absolute page URLs found line by line, then by pattern
///
/// Asset files, sitemap files and XML schema URLs are filtered out.
pub fn extract_heuristic(text: &str) -> Vec<SitemapUrlRecord> {
    let mut candidates: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            (line.starts_with("http://") || line.starts_with("https://"))
                && !line.contains(char::is_whitespace)
        })
        .map(str::to_string)
        .collect();

    if candidates.is_empty() {
        candidates = absolute_url_regex()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
    }

    dedup(
        candidates
            .into_iter()
            .map(|u| clean_url(&u))
            .filter(|u| is_page_url(u))
            .collect(),
    )
    .into_iter()
    .map(SitemapUrlRecord::new)
    .collect()
}

/// Whether a URL plausibly names a page rather than an asset or sitemap
pub fn is_page_url(url: &str) -> bool {
    if url.len() <= "https://".len() || is_schema_url(url) {
        return false;
    }

    let path = url.split(['?', '#']).next().unwrap_or("").to_ascii_lowercase();
    let after_host = path.splitn(4, '/').nth(3).unwrap_or("");
    let file = after_host.rsplit('/').next().unwrap_or("");

    match file.rsplit_once('.') {
        Some((_, ext)) => {
            !ASSET_EXTENSIONS.contains(&ext) && !SITEMAP_EXTENSIONS.contains(&ext)
        }
        None => true,
    }
}

fn is_schema_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    SCHEMA_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Strips punctuation that trails URLs embedded in prose or markup
fn clean_url(url: &str) -> String {
    url.trim_end_matches(['.', ',', ';', ')', ']', '>', '"', '\''])
        .replace("&amp;", "&")
}

fn bare_locs(text: &str) -> Vec<String> {
    dedup(
        loc_regex()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| clean_url(m.as_str()))
            .filter(|u| !u.is_empty())
            .collect(),
    )
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// Walks the document collecting entries whose element is named `entry`
fn walk_entries(text: &str, entry: &str) -> Result<Vec<SitemapUrlRecord>, quick_xml::Error> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<SitemapUrlRecord> = None;
    let mut entries = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                if name == entry {
                    current = Some(SitemapUrlRecord::default());
                }
                stack.push(name);
            }
            Event::End(_) => {
                if let Some(name) = stack.pop() {
                    if name == entry {
                        if let Some(record) = current.take().filter(|r| !r.loc.is_empty()) {
                            entries.push(record);
                        }
                    }
                }
            }
            Event::Text(ref e) => {
                let value = e.unescape()?.trim().to_string();
                assign_field(&stack, entry, current.as_mut(), value);
            }
            Event::CData(e) => {
                let value = String::from_utf8_lossy(&e.into_inner()).trim().to_string();
                assign_field(&stack, entry, current.as_mut(), value);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Stores a text value if its element is a direct child of the entry
fn assign_field(stack: &[String], entry: &str, record: Option<&mut SitemapUrlRecord>, value: String) {
    let (Some(record), [.., parent, field]) = (record, stack) else {
        return;
    };
    if parent != entry || value.is_empty() {
        return;
    }

    match field.as_str() {
        "loc" => record.loc.push_str(&value),
        "lastmod" => record.lastmod = Some(value),
        "changefreq" => record.changefreq = Some(value.to_ascii_lowercase()),
        "priority" => record.priority = value.parse::<f64>().ok().filter(|p| p.is_finite()),
        _ => {}
    }
}
