//! Pipeline runs against local mock servers

use crate::{html_page, test_config};
use flate2::write::GzEncoder;
use flate2::Compression;
use page_lens::config::Config;
use page_lens::fetch::FailureKind;
use page_lens::{Pipeline, PipelineError, ScrapeReport};
use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pipeline(config: &Config) -> Pipeline {
    Pipeline::from_config(config).expect("Failed to build pipeline")
}

async fn run_ok(config: &Config, url: &str, retries: u32) -> ScrapeReport {
    match pipeline(config).run(url, retries).await {
        Ok(report) => report,
        Err(e) => panic!("expected success for {}, got {:?}", url, e),
    }
}

async fn run_err(config: &Config, url: &str, retries: u32) -> PipelineError {
    match pipeline(config).run(url, retries).await {
        Ok(report) => panic!("expected failure for {}, got {:?}", url, report),
        Err(e) => e,
    }
}

#[tokio::test]
async fn test_fetch_and_extract_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page(
                    "Home",
                    r#"<p>Welcome home</p><a href="/about">About</a><a href="/about">Again</a>"#,
                ))
                .insert_header("content-type", "text/html; charset=utf-8")
                .insert_header("x-frame-options", "DENY")
                .insert_header("server", "mock"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/", mock_server.uri());
    let report = run_ok(&test_config(), &url, 3).await;

    assert_eq!(report.metadata.attempts, 1);
    assert_eq!(report.transport.status_code, 200);
    assert_eq!(report.transport.content_type, "text/html; charset=utf-8");
    assert_eq!(report.transport.encoding.as_deref(), Some("utf-8"));
    assert!(!report.transport.redirected);
    assert_eq!(report.transport.security_headers["x-frame-options"], "DENY");
    assert_eq!(report.transport.headers["server"], "mock");

    assert_eq!(report.content.title, "Home");
    assert!(report.content.content.contains("Welcome home"));
    assert_eq!(
        report.content.links,
        vec![format!("{}/about", mock_server.uri())]
    );
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .and(header_exists("sec-fetch-mode"))
        .and(header("dnt", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("H", "")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_ok(&test_config(), &mock_server.uri(), 1).await;
    assert_eq!(report.content.title, "H");
}

#[tokio::test]
async fn test_rate_limited_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Back", "")))
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let report = run_ok(&test_config(), &url, 3).await;

    assert_eq!(report.metadata.attempts, 2);
    assert_eq!(report.content.title, "Back");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = run_err(&test_config(), &mock_server.uri(), 5).await;

    let PipelineError::Fetch(failure) = err else {
        panic!("expected a fetch failure");
    };
    assert_eq!(failure.kind, FailureKind::Forbidden);
    assert_eq!(failure.status_code, Some(403));
    assert_eq!(failure.attempts, 1);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = run_err(&test_config(), &mock_server.uri(), 3).await;

    let PipelineError::Fetch(failure) = err else {
        panic!("expected a fetch failure");
    };
    assert_eq!(failure.kind, FailureKind::HttpError(404));
    assert_eq!(failure.attempts, 1);
}

#[tokio::test]
async fn test_persistent_timeout_uses_every_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let err = run_err(&test_config(), &mock_server.uri(), 2).await;

    let PipelineError::Fetch(failure) = err else {
        panic!("expected a fetch failure");
    };
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(failure.attempts, 2);
    assert_eq!(failure.status_code, None);
}

#[tokio::test]
async fn test_connection_refused_is_retried() {
    // Reserve a port, then free it so nothing is listening there
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let url = format!("http://127.0.0.1:{}/", port);
    let err = run_err(&test_config(), &url, 2).await;

    let PipelineError::Fetch(failure) = err else {
        panic!("expected a fetch failure");
    };
    assert_eq!(failure.kind, FailureKind::ConnectionError);
    assert_eq!(failure.attempts, 2);
}

#[tokio::test]
async fn test_redirect_chain_is_recorded() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/middle"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/middle"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/new/", base).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("New", r#"<a href="child">child</a>"#)),
        )
        .mount(&mock_server)
        .await;

    let report = run_ok(&test_config(), &format!("{}/old", base), 1).await;

    assert_eq!(report.metadata.url, format!("{}/old", base));
    assert!(report.transport.redirected);
    assert_eq!(report.transport.redirect_count, 2);
    assert_eq!(
        report.transport.redirect_chain,
        vec![format!("{}/old", base), format!("{}/middle", base)]
    );
    assert_eq!(report.transport.final_url, format!("{}/new/", base));
    // Relative links resolve against the final URL
    assert_eq!(report.content.links, vec![format!("{}/new/child", base)]);
}

#[tokio::test]
async fn test_redirect_loop_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.fetch.max_redirects = 3;
    let err = run_err(&config, &format!("{}/loop", mock_server.uri()), 1).await;

    let PipelineError::Fetch(failure) = err else {
        panic!("expected a fetch failure");
    };
    assert_eq!(failure.kind, FailureKind::Unknown);
    assert!(failure.message.contains("redirects"));
}

#[tokio::test]
async fn test_invalid_url_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    for url in ["", "example.com", "ftp://127.0.0.1/file"] {
        let err = run_err(&test_config(), url, 3).await;
        assert!(matches!(err, PipelineError::Validation(_)), "url={:?}", url);
    }
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cookies_are_captured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "session=abc; Path=/; HttpOnly")
                .append_header("set-cookie", "theme=dark")
                .set_body_string(html_page("C", "")),
        )
        .mount(&mock_server)
        .await;

    let report = run_ok(&test_config(), &mock_server.uri(), 1).await;

    assert_eq!(report.transport.cookies.len(), 2);
    assert_eq!(report.transport.cookies["session"], "abc");
    assert_eq!(report.transport.cookies["theme"], "dark");
}

#[tokio::test]
async fn test_gzip_response_keeps_encoding_headers() {
    let mock_server = MockServer::start().await;

    let page = html_page("Zipped", "<p>Packed content</p>");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(page.as_bytes()).unwrap();
    let packed = encoder.finish().unwrap();
    let packed_len = packed.len() as u64;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(packed)
                .insert_header("content-type", "text/html")
                .insert_header("content-encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let report = run_ok(&test_config(), &mock_server.uri(), 1).await;

    assert!(report.transport.is_compressed);
    assert_eq!(report.transport.headers["content-encoding"], "gzip");
    assert_eq!(report.transport.content_length, packed_len);
    assert_eq!(report.content.title, "Zipped");
    assert!(report.content.content.contains("Packed content"));
}

#[tokio::test]
async fn test_corrupt_gzip_body_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"definitely not gzip".to_vec())
                .insert_header("content-encoding", "gzip"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let err = run_err(&test_config(), &mock_server.uri(), 2).await;

    let PipelineError::Fetch(failure) = err else {
        panic!("expected a fetch failure");
    };
    assert_eq!(failure.kind, FailureKind::Unknown);
    assert_eq!(failure.attempts, 2);
    assert!(failure.message.contains("decode"));
}
