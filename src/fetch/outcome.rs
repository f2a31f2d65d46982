//! Fetch results and the failure taxonomy

use thiserror::Error;

/// Result of a single `FetchEngine::fetch` call
pub type FetchOutcome = Result<Page, FetchError>;

/// Page content returned by a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The URL that was requested
    pub url: String,

    /// Raw response body
    pub body: String,

    /// Number of network attempts spent (0 when served from cache)
    pub attempts: u32,

    /// Whether the body came from the response cache
    pub from_cache: bool,
}

/// Why a fetch did not produce content
///
/// `Timeout`, `Throttled`, `HttpError` and `NetworkError` describe a single
/// attempt and are retried by the engine. Callers only ever see
/// `Disallowed`, `RetriesExhausted`, `DeadlineExceeded` or `InvalidUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("URL disallowed by robots.txt: {url}")]
    Disallowed { url: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by server (HTTP 429)")]
    Throttled,

    #[error("HTTP {0}")]
    HttpError(u16),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Gave up on {url} after {attempts} attempts (last error: {last})")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },

    #[error("Deadline exceeded for {url} after {attempts} attempts")]
    DeadlineExceeded { url: String, attempts: u32 },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Classifies a transport-level reqwest error
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::NetworkError(format!("Connection failed: {}", error))
        } else {
            Self::NetworkError(error.to_string())
        }
    }

    /// Returns true for failures the engine answers with back-off and retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Throttled | Self::HttpError(_) | Self::NetworkError(_)
        )
    }

    /// Short, stable name of the failure kind (used in logs and run metrics)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disallowed { .. } => "disallowed",
            Self::Timeout => "timeout",
            Self::Throttled => "throttled",
            Self::HttpError(_) => "http_error",
            Self::NetworkError(_) => "network_error",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::InvalidUrl { .. } => "invalid_url",
        }
    }

    /// For an exhausted fetch, the failure of the final attempt
    pub fn last_attempt_error(&self) -> Option<&FetchError> {
        match self {
            Self::RetriesExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}
