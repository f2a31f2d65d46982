//! Fetch engine behavior against a mock server: caching, retries, spacing

use crate::test_fetch_config;
use futures::future::join_all;
use polite_fetch::config::FetchConfig;
use polite_fetch::{FetchEngine, FetchError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_success_is_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>offers</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(test_fetch_config()).unwrap();
    let url = format!("{}/offers", mock_server.uri());

    let first = engine.fetch(&url).await.unwrap();
    assert_eq!(first.body, "<html>offers</html>");
    assert_eq!(first.attempts, 1);
    assert!(!first.from_cache);

    let second = engine.fetch(&url).await.unwrap();
    assert_eq!(second.body, "<html>offers</html>");
    assert!(second.from_cache);

    let stats = engine.stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.successes, 1);
    assert_eq!(stats.cache_hits, 1);
}

#[tokio::test]
async fn test_sends_agent_and_accept_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(wiremock::matchers::header(
            "user-agent",
            "TestBot/1.0 (+https://example.com/bot)",
        ))
        .and(wiremock::matchers::header_exists("accept"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(test_fetch_config()).unwrap();
    let page = engine.fetch(&format!("{}/", mock_server.uri())).await.unwrap();
    assert_eq!(page.body, "ok");
}

#[tokio::test]
async fn test_throttled_then_success() {
    let mock_server = MockServer::start().await;

    // Two 429s, then the page
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(FetchConfig {
        retry_delay_ms: 50,
        ..test_fetch_config()
    })
    .unwrap();

    let start = Instant::now();
    let page = engine
        .fetch(&format!("{}/busy", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(page.body, "finally");
    assert_eq!(page.attempts, 3);
    // 50ms after the first failure, 100ms after the second
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert_eq!(engine.stats().requests, 3);
}

#[tokio::test]
async fn test_timeouts_exhaust_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_millis(500)),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(FetchConfig {
        request_timeout_ms: 100,
        max_retries: 2,
        ..test_fetch_config()
    })
    .unwrap();

    let url = format!("{}/slow", mock_server.uri());
    let outcome = engine.fetch(&url).await;

    assert_eq!(
        outcome,
        Err(FetchError::RetriesExhausted {
            url,
            attempts: 3,
            last: Box::new(FetchError::Timeout),
        })
    );

    let stats = engine.stats();
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.successes, 0);
}

#[tokio::test]
async fn test_http_error_keeps_last_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(FetchConfig {
        max_retries: 1,
        ..test_fetch_config()
    })
    .unwrap();

    let error = engine
        .fetch(&format!("{}/down", mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "retries_exhausted");
    assert_eq!(error.last_attempt_error(), Some(&FetchError::HttpError(503)));
}

#[tokio::test]
async fn test_zero_retries_means_one_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(FetchConfig {
        max_retries: 0,
        ..test_fetch_config()
    })
    .unwrap();

    let outcome = engine
        .fetch(&format!("{}/missing", mock_server.uri()))
        .await;

    assert!(matches!(
        outcome,
        Err(FetchError::RetriesExhausted { attempts: 1, .. })
    ));
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(FetchConfig {
        max_retries: 0,
        ..test_fetch_config()
    })
    .unwrap();
    let url = format!("{}/flaky", mock_server.uri());

    assert!(engine.fetch(&url).await.is_err());

    let page = engine.fetch(&url).await.unwrap();
    assert_eq!(page.body, "recovered");
    assert!(!page.from_cache);
}

#[tokio::test]
async fn test_concurrent_fetches_share_rate_gate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("page"))
        .expect(3)
        .mount(&mock_server)
        .await;

    // One request every 100ms
    let engine = Arc::new(
        FetchEngine::new(FetchConfig {
            max_requests_per_second: 10.0,
            ..test_fetch_config()
        })
        .unwrap(),
    );

    let urls: Vec<String> = (1..=3)
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();

    let start = Instant::now();
    let outcomes = join_all(urls.iter().map(|url| {
        let engine = Arc::clone(&engine);
        async move { engine.fetch(url).await }
    }))
    .await;

    assert!(outcomes.iter().all(|outcome| outcome.is_ok()));
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_overall_deadline_stops_retrying() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let engine = FetchEngine::new(FetchConfig {
        max_retries: 10,
        retry_delay_ms: 400,
        overall_deadline_secs: Some(1),
        ..test_fetch_config()
    })
    .unwrap();

    let start = Instant::now();
    let outcome = engine
        .fetch(&format!("{}/never", mock_server.uri()))
        .await;

    assert!(matches!(
        outcome,
        Err(FetchError::DeadlineExceeded { attempts, .. }) if attempts >= 2
    ));
    assert!(start.elapsed() < Duration::from_secs(3));
}
