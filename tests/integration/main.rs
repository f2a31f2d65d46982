//! Integration tests for polite-fetch
//!
//! These tests use wiremock to create mock HTTP servers and drive the fetch
//! engine and harvest coordinator end-to-end.

mod fetch_tests;
mod robots_tests;

use polite_fetch::config::FetchConfig;

/// Fast, deterministic settings: no jitter, generous rate, short back-off
pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        max_requests_per_second: 1000.0,
        user_agent: "TestBot/1.0 (+https://example.com/bot)".to_string(),
        request_timeout_ms: 2000,
        max_retries: 3,
        retry_delay_ms: 10,
        respect_robots_txt: false,
        jitter_min_ms: 0,
        jitter_max_ms: 0,
        ..FetchConfig::default()
    }
}
