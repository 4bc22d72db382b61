//! Fallback crawler against a mock server

use crate::common::{html, test_client, test_config, LinkFarm};
use sitemap_scout::crawler::{FallbackCrawler, RobotsFilter};
use sitemap_scout::robots::ParsedRobots;
use std::collections::HashSet;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_respects_page_budget_and_queue_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(LinkFarm)
        .mount(&mock_server)
        .await;

    let crawler = FallbackCrawler::new(test_client(&test_config()), 200);
    let base = Url::parse(&mock_server.uri()).unwrap();
    let report = crawler.crawl_detailed(&base, 7, None).await;

    assert_eq!(report.pages.len(), 7);
    assert!(report.peak_pending <= 14);

    let unique: HashSet<&str> = report.pages.iter().map(|p| p.loc.as_str()).collect();
    assert_eq!(unique.len(), 7);
    assert_eq!(report.pages[0].loc, format!("{}/", mock_server.uri()));
    assert!(report.pages.iter().all(|p| p.status_code == Some(200)));
}

#[tokio::test]
async fn test_crawl_follows_same_domain_links_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(
            r#"<html><head><meta name="description" content="Home page"></head><body>
            <a href="/about">About</a>
            <a href="{}/contact#form">Contact</a>
            <a href="https://elsewhere.example/">Elsewhere</a>
            <a href="mailto:team@example.com">Mail</a>
            </body></html>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<html><body><a href="/">Home</a></body></html>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html("<html><body>Contact us</body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = FallbackCrawler::new(test_client(&test_config()), 200);
    let base = Url::parse(&base_url).unwrap();
    let pages = crawler.crawl(&base, 50, None).await;

    let locs: Vec<&str> = pages.iter().map(|p| p.loc.as_str()).collect();
    assert_eq!(locs.len(), 3);
    assert!(locs.contains(&format!("{}/about", base_url).as_str()));
    assert!(locs.contains(&format!("{}/contact", base_url).as_str()));
    assert!(locs.iter().all(|l| l.starts_with(&base_url)));
    assert_eq!(pages[0].meta_description.as_deref(), Some("Home page"));
}

#[tokio::test]
async fn test_crawl_records_failed_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<html><body><a href="/gone">Gone</a></body></html>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let crawler = FallbackCrawler::new(test_client(&test_config()), 200);
    let base = Url::parse(&mock_server.uri()).unwrap();
    let pages = crawler.crawl(&base, 10, None).await;

    assert_eq!(pages.len(), 2);
    let gone = &pages[1];
    assert_eq!(gone.status_code, Some(404));
    assert!(gone.error.is_some());
}

#[tokio::test]
async fn test_crawl_skips_disallowed_links() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><a href="/private/report">Secret</a><a href="/public">Public</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html("<html><body>Open</body></html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/report"))
        .respond_with(html("<html><body>Hidden</body></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let filter = RobotsFilter {
        robots: ParsedRobots::from_content("User-agent: *\nDisallow: /private\n"),
        agent: "Mozilla".to_string(),
    };
    let crawler = FallbackCrawler::new(test_client(&test_config()), 200);
    let base = Url::parse(&mock_server.uri()).unwrap();
    let report = crawler.crawl_detailed(&base, 10, Some(&filter)).await;

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.disallowed, 1);
}
