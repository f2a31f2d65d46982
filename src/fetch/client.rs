//! HTTP client construction
//!
//! One client is built per engine and shared with its robots policy, so page
//! and robots.txt requests carry the same identity and timeout.

use crate::config::FetchConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Accept header sent with every request
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Upper bound on connection establishment, independent of the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration (agent string, timeout, language)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use polite_fetch::config::FetchConfig;
/// use polite_fetch::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    if let Some(language) = &config.accept_language {
        match HeaderValue::from_str(language) {
            Ok(value) => {
                headers.insert(ACCEPT_LANGUAGE, value);
            }
            Err(_) => tracing::warn!("Ignoring invalid Accept-Language value: {}", language),
        }
    }

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout()))
        .gzip(true)
        .brotli(true)
        .build()
}
