//! Sitemap locator and parser against a mock server

use crate::common::{gzip, html, sitemap_index, test_client, test_config, urlset, xml};
use sitemap_scout::sitemap::{EnrichOptions, SitemapLocator, SitemapParser};
use std::collections::HashSet;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn no_enrichment() -> EnrichOptions {
    EnrichOptions {
        enabled: false,
        ..EnrichOptions::default()
    }
}

fn pages(base: &str, prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}/{}-{}", base, prefix, i))
        .collect()
}

#[tokio::test]
async fn test_locator_finds_robots_directive_and_well_known_path() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nAllow: /\nSitemap: {}/custom-map.xml\n",
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&pages(&base_url, "a", 1))))
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let locator = SitemapLocator::new(client, 0);
    let base = Url::parse(&base_url).unwrap();
    let located = locator.locate(&base).await;

    assert_eq!(
        located,
        vec![
            format!("{}/custom-map.xml", base_url),
            format!("{}/sitemap.xml", base_url),
        ]
    );
}

#[tokio::test]
async fn test_locator_ignores_soft_404_pages() {
    let mock_server = MockServer::start().await;

    // Every path answers with the same HTML page
    Mock::given(method("GET"))
        .respond_with(html("<html><body>Nothing here</body></html>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let locator = SitemapLocator::new(client, 0);
    let base = Url::parse(&mock_server.uri()).unwrap();

    assert!(locator.locate(&base).await.is_empty());
}

#[tokio::test]
async fn test_index_with_two_leaves() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let first = pages(&base_url, "post", 3);
    let mut second = pages(&base_url, "page", 5);
    // Duplicate across leaves is dropped
    second.push(first[0].clone());

    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(xml(&sitemap_index(&[
            format!("{}/posts.xml", base_url),
            format!("{}/pages.xml", base_url),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/posts.xml"))
        .respond_with(xml(&urlset(&first)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pages.xml"))
        .respond_with(xml(&urlset(&second)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let parser = SitemapParser::new(test_client(&test_config()), no_enrichment());
    let records = parser
        .parse(&[format!("{}/sitemap_index.xml", base_url)])
        .await;

    assert_eq!(records.len(), 8);
    let unique: HashSet<&str> = records.iter().map(|r| r.loc.as_str()).collect();
    assert_eq!(unique.len(), 8);
    assert_eq!(records[0].loc, first[0]);
}

#[tokio::test]
async fn test_self_referencing_index_terminates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let index_url = format!("{}/sitemap_index.xml", base_url);

    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(xml(&sitemap_index(&[
            index_url.clone(),
            format!("{}/leaf.xml", base_url),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/leaf.xml"))
        .respond_with(xml(&urlset(&pages(&base_url, "leaf", 2))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let parser = SitemapParser::new(test_client(&test_config()), no_enrichment());
    let records = parser.parse(&[index_url.clone(), index_url]).await;

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_gzip_leaf_and_relative_children() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/maps/index.xml"))
        .respond_with(xml(&sitemap_index(&["archive.xml.gz".to_string()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/maps/archive.xml.gz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                gzip(&urlset(&pages(&base_url, "old", 4))),
                "application/octet-stream",
            ),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let parser = SitemapParser::new(test_client(&test_config()), no_enrichment());
    let records = parser
        .parse(&[format!("{}/maps/index.xml", base_url)])
        .await;

    assert_eq!(records.len(), 4);
    assert_eq!(records[3].loc, format!("{}/old-3", base_url));
}

#[tokio::test]
async fn test_unreachable_sitemap_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/good.xml"))
        .respond_with(xml(&urlset(&pages(&base_url, "ok", 2))))
        .mount(&mock_server)
        .await;

    let parser = SitemapParser::new(test_client(&test_config()), no_enrichment());
    let records = parser
        .parse(&[
            format!("{}/missing.xml", base_url),
            format!("{}/good.xml", base_url),
        ])
        .await;

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_descriptions_filled_from_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let locs = pages(&base_url, "doc", 2);

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&locs)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doc-0"))
        .respond_with(html(
            r#"<html><head><meta name="description" content="  First   document "></head></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let enrich = EnrichOptions {
        enabled: true,
        limit: 10,
        description_length: 100,
        max_retries: 0,
    };
    let parser = SitemapParser::new(test_client(&test_config()), enrich);
    let records = parser.parse(&[format!("{}/sitemap.xml", base_url)]).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].meta_description.as_deref(), Some("First document"));
    assert!(records[1].meta_description.is_none());
}

#[tokio::test]
async fn test_collect_leaves_descriptions_to_enrich() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let locs = pages(&base_url, "note", 1);

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&locs)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/note-0"))
        .respond_with(html(
            r#"<html><head><meta name="description" content="A note"></head></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let enrich = EnrichOptions {
        enabled: true,
        limit: 10,
        description_length: 100,
        max_retries: 0,
    };
    let parser = SitemapParser::new(test_client(&test_config()), enrich);
    let mut records = parser.collect(&[format!("{}/sitemap.xml", base_url)]).await;
    assert_eq!(records.len(), 1);
    assert!(records[0].meta_description.is_none());

    parser.enrich(&mut records).await;
    assert_eq!(records[0].meta_description.as_deref(), Some("A note"));
}
