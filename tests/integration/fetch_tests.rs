//! Governed fetch client against a mock server

use crate::common::{gzip, test_client, test_config};
use sitemap_scout::crawler::FetchErrorKind;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_success_reports_body_and_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<html><body>Hi</body></html>".to_vec(), "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let result = client.get(&format!("{}/page", mock_server.uri())).await;

    assert!(result.success);
    assert_eq!(result.status_code, Some(200));
    assert!(result.is_html());
    assert!(result.content.contains("Hi"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_not_found_is_not_retried_and_does_not_arm_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let result = client.get(&format!("{}/missing", mock_server.uri())).await;

    assert!(!result.success);
    assert_eq!(result.status_code, Some(404));
    assert_eq!(result.error_kind, Some(FetchErrorKind::HttpStatus(404)));

    let state = client
        .governor()
        .snapshot("127.0.0.1")
        .await
        .expect("domain should be tracked");
    assert_eq!(state.consecutive_failures, 0);
    assert!(state.backoff_until.is_none());
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"ok".to_vec(), "text/plain"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let result = client.get(&format!("{}/flaky", mock_server.uri())).await;

    assert!(result.success);
    assert_eq!(result.content, "ok");

    // 500 is transient and leaves the failure count alone
    let state = client.governor().snapshot("127.0.0.1").await.unwrap();
    assert_eq!(state.consecutive_failures, 0);
}

#[tokio::test]
async fn test_blocking_status_exhausts_retries_and_counts_failures() {
    let mock_server = MockServer::start().await;

    // One attempt plus two retries
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let result = client.get(&format!("{}/busy", mock_server.uri())).await;

    assert!(!result.success);
    assert_eq!(result.status_code, Some(503));
    assert_eq!(result.error_kind, Some(FetchErrorKind::HttpStatus(503)));

    let state = client.governor().snapshot("127.0.0.1").await.unwrap();
    assert!(state.consecutive_failures >= 1);
}

#[tokio::test]
async fn test_success_clears_failure_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"fine".to_vec(), "text/plain"))
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let result = client.get(&format!("{}/limited", mock_server.uri())).await;

    assert!(result.success);
    let state = client.governor().snapshot("127.0.0.1").await.unwrap();
    assert_eq!(state.consecutive_failures, 0);
}

#[tokio::test]
async fn test_gzip_body_without_content_encoding() {
    let mock_server = MockServer::start().await;
    let body = "<?xml version=\"1.0\"?><urlset><url><loc>https://e.com/</loc></url></urlset>";

    Mock::given(method("GET"))
        .and(path("/sitemap.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(gzip(body), "application/x-gzip"))
        .mount(&mock_server)
        .await;

    let client = test_client(&test_config());
    let result = client
        .get(&format!("{}/sitemap.xml.gz", mock_server.uri()))
        .await;

    assert!(result.success);
    assert_eq!(result.content, body);
    assert!(result.content_type.contains("xml"));
}

#[tokio::test]
async fn test_unreachable_host_fails_with_connection_error() {
    let config = test_config();
    let client = test_client(&config);

    // Nothing listens on port 9 of localhost
    let result = client.fetch("http://127.0.0.1:9/", 0).await;

    assert!(!result.success);
    assert!(result.status_code.is_none());
    assert!(matches!(
        result.error_kind,
        Some(FetchErrorKind::Connection) | Some(FetchErrorKind::Timeout)
    ));
}
