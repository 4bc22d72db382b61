//! End-to-end discovery through the coordinator

use crate::common::{html, test_config, urlset, xml};
use sitemap_scout::output::{render_result, OutputFormat};
use sitemap_scout::{Coordinator, DiscoveryMethod, UrlRecord};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_small_site(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><a href="/about">About</a><a href="/blog">Blog</a></body></html>"#,
        ))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<html><body><a href="/">Home</a></body></html>"#))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(html("<html><body>Posts</body></html>"))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_discovery_uses_existing_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let locs: Vec<String> = ["/", "/a", "/b"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&locs)))
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(test_config()).unwrap();
    let result = coordinator.discover(&base_url, 100.0, None).await;

    assert!(result.success, "discovery failed: {:?}", result.error);
    assert_eq!(result.method, Some(DiscoveryMethod::ExistingSitemap));
    assert_eq!(result.url_count, 3);
    assert_eq!(result.urls.len(), 3);
    assert!(matches!(result.urls[0], UrlRecord::Sitemap(_)));
    assert_eq!(result.urls[1].loc(), locs[1]);

    let json = render_result(&result, OutputFormat::Records).unwrap();
    assert!(json.contains("\"existing_sitemap\""));
}

#[tokio::test]
async fn test_discovery_falls_back_to_crawl_without_sitemap() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let coordinator = Coordinator::new(test_config()).unwrap();
    let result = coordinator
        .discover(&mock_server.uri(), 100.0, Some(10))
        .await;

    assert!(result.success, "discovery failed: {:?}", result.error);
    assert_eq!(result.method, Some(DiscoveryMethod::Generated));
    assert_eq!(result.url_count, 3);
    assert!(result
        .urls
        .iter()
        .all(|record| matches!(record, UrlRecord::Crawled(_))));

    let table = render_result(&result, OutputFormat::Table).unwrap();
    assert!(table.starts_with("loc,status_code"));
    assert_eq!(table.lines().count(), 4);
}

#[tokio::test]
async fn test_empty_sitemap_falls_back_to_crawl() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(test_config()).unwrap();
    let result = coordinator.discover(&mock_server.uri(), 100.0, None).await;

    assert!(result.success);
    assert_eq!(result.method, Some(DiscoveryMethod::Generated));
    assert_eq!(result.url_count, 3);
}

#[tokio::test]
async fn test_page_budget_limits_generated_result() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let coordinator = Coordinator::new(test_config()).unwrap();
    let result = coordinator
        .discover(&mock_server.uri(), 100.0, Some(1))
        .await;

    assert!(result.success);
    assert_eq!(result.url_count, 1);
    assert_eq!(result.urls[0].loc(), format!("{}/", mock_server.uri()));
}

#[tokio::test]
async fn test_robots_crawl_delay_slows_the_domain() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 0.05\n"),
        )
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(test_config()).unwrap();
    let result = coordinator
        .discover(&mock_server.uri(), 100.0, Some(3))
        .await;
    assert!(result.success);

    let state = coordinator
        .governor()
        .snapshot("127.0.0.1")
        .await
        .expect("domain should be tracked");
    assert_eq!(state.request_interval.as_millis(), 50);
}

#[tokio::test]
async fn test_invalid_rate_fails_without_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(test_config()).unwrap();
    let result = coordinator.discover(&mock_server.uri(), -1.0, None).await;

    assert!(!result.success);
    assert!(result.method.is_none());
    assert!(result.urls.is_empty());
    assert!(result.error.is_some());
}
