//! robots.txt compliance through the fetch engine

use crate::test_fetch_config;
use polite_fetch::config::FetchConfig;
use polite_fetch::{FetchEngine, FetchError};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn robots_config() -> FetchConfig {
    FetchConfig {
        respect_robots_txt: true,
        ..test_fetch_config()
    }
}

async fn mount_robots(mock_server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn mount_page(mock_server: &MockServer, page: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("<p>{}</p>", page)))
        .expect(hits)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, "User-agent: *\nDisallow: /private\nAllow: /").await;
    mount_page(&mock_server, "/public", 1).await;
    // Must never be requested
    mount_page(&mock_server, "/private", 0).await;

    let engine = FetchEngine::new(robots_config()).unwrap();
    let private_url = format!("{}/private", mock_server.uri());

    assert_eq!(
        engine.fetch(&private_url).await,
        Err(FetchError::Disallowed { url: private_url })
    );
    assert!(engine
        .fetch(&format!("{}/public", mock_server.uri()))
        .await
        .is_ok());

    let stats = engine.stats();
    assert_eq!(stats.disallowed, 1);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.requests, 1);
    assert_eq!(engine.robots().cached_origins(), 1);
}

#[tokio::test]
async fn test_disallowed_is_not_retried() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, "User-agent: *\nDisallow: /").await;
    mount_page(&mock_server, "/", 0).await;

    let engine = FetchEngine::new(FetchConfig {
        max_retries: 5,
        retry_delay_ms: 1000,
        ..robots_config()
    })
    .unwrap();

    let start = Instant::now();
    let outcome = engine.fetch(&format!("{}/", mock_server.uri())).await;

    assert!(matches!(outcome, Err(FetchError::Disallowed { .. })));
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_agent_specific_group_uses_product_token() {
    let mock_server = MockServer::start().await;

    mount_robots(
        &mock_server,
        "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /",
    )
    .await;
    mount_page(&mock_server, "/page", 0).await;

    // The full agent string carries a version and contact URL
    let engine = FetchEngine::new(robots_config()).unwrap();
    let outcome = engine.fetch(&format!("{}/page", mock_server.uri())).await;

    assert!(matches!(outcome, Err(FetchError::Disallowed { .. })));
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/a", 1).await;
    mount_page(&mock_server, "/b", 1).await;

    let engine = FetchEngine::new(robots_config()).unwrap();

    assert!(engine.fetch(&format!("{}/a", mock_server.uri())).await.is_ok());
    assert!(engine.fetch(&format!("{}/b", mock_server.uri())).await.is_ok());

    let record = engine.robots().record(&mock_server.uri()).unwrap();
    assert!(record.robots.is_allow_all());
}

#[tokio::test]
async fn test_robots_server_error_allows_everything() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", 1).await;

    let engine = FetchEngine::new(robots_config()).unwrap();

    assert!(engine.fetch(&format!("{}/", mock_server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_robots_fetched_once_per_origin() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    for page in ["/one", "/two", "/three"] {
        mount_page(&mock_server, page, 1).await;
    }

    let engine = FetchEngine::new(robots_config()).unwrap();
    for page in ["/one", "/two", "/three"] {
        let url = format!("{}{}", mock_server.uri(), page);
        assert!(engine.fetch(&url).await.is_ok());
    }

    assert_eq!(engine.robots().cached_origins(), 1);
}

#[tokio::test]
async fn test_crawl_delay_spaces_requests() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, "User-agent: *\nCrawl-delay: 0.3\nAllow: /").await;
    mount_page(&mock_server, "/first", 1).await;
    mount_page(&mock_server, "/second", 1).await;

    let engine = FetchEngine::new(robots_config()).unwrap();

    let start = Instant::now();
    assert!(engine
        .fetch(&format!("{}/first", mock_server.uri()))
        .await
        .is_ok());
    assert!(engine
        .fetch(&format!("{}/second", mock_server.uri()))
        .await
        .is_ok());

    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", 1).await;

    let engine = FetchEngine::new(test_fetch_config()).unwrap();

    assert!(engine.fetch(&format!("{}/", mock_server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_huge_crawl_delay_is_capped() {
    let slow_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    mount_robots(&slow_server, "User-agent: *\nCrawl-delay: 86400").await;
    mount_page(&slow_server, "/a", 1).await;
    mount_page(&slow_server, "/b", 1).await;
    mount_page(&other_server, "/c", 1).await;

    let engine = FetchEngine::new(FetchConfig {
        max_crawl_delay_secs: 1,
        ..robots_config()
    })
    .unwrap();

    let start = Instant::now();
    let fetches = async {
        for url in [
            format!("{}/a", slow_server.uri()),
            format!("{}/b", slow_server.uri()),
            format!("{}/c", other_server.uri()),
        ] {
            assert!(engine.fetch(&url).await.is_ok());
        }
    };
    tokio::time::timeout(Duration::from_secs(10), fetches)
        .await
        .expect("Crawl-delay should be capped");

    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_deadline_checked_after_gate_wait() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, "User-agent: *\nCrawl-delay: 2").await;
    mount_page(&mock_server, "/first", 1).await;
    // The gate wait outlasts the deadline, so this is never dispatched
    mount_page(&mock_server, "/second", 0).await;

    let engine = FetchEngine::new(FetchConfig {
        overall_deadline_secs: Some(1),
        ..robots_config()
    })
    .unwrap();

    assert!(engine
        .fetch(&format!("{}/first", mock_server.uri()))
        .await
        .is_ok());

    let outcome = engine
        .fetch(&format!("{}/second", mock_server.uri()))
        .await;
    assert!(matches!(
        outcome,
        Err(FetchError::DeadlineExceeded { attempts: 0, .. })
    ));
}
