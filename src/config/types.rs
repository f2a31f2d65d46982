use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Polite-Fetch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetConfig>,
}

/// Fetch engine behavior configuration
///
/// Created once at startup and read-only afterward. Every field has a
/// default so a config file only needs to name what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Ceiling on outgoing request rate (requests per second)
    #[serde(rename = "max-requests-per-second")]
    pub max_requests_per_second: f64,

    /// Identifying agent string sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Number of retries after the first attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay for exponential back-off (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Whether robots.txt directives are enforced
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    /// Width of the response cache time bucket (seconds)
    #[serde(rename = "cache-bucket-secs")]
    pub cache_bucket_secs: u64,

    /// Lower bound of the random pre-dispatch delay (milliseconds)
    #[serde(rename = "jitter-min-ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the random pre-dispatch delay (milliseconds)
    #[serde(rename = "jitter-max-ms")]
    pub jitter_max_ms: u64,

    /// Optional Accept-Language header value
    #[serde(rename = "accept-language")]
    pub accept_language: Option<String>,

    /// Optional cap on the total time a single fetch may spend (seconds)
    #[serde(rename = "overall-deadline-secs")]
    pub overall_deadline_secs: Option<u64>,

    /// Upper bound on a robots.txt `Crawl-delay` honored as gate spacing
    /// (seconds, 0 ignores `Crawl-delay`)
    #[serde(rename = "max-crawl-delay-secs")]
    pub max_crawl_delay_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_requests_per_second: 0.5,
            user_agent: "PoliteFetch/1.0 (+https://example.com/bot-info)".to_string(),
            request_timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 5000,
            respect_robots_txt: true,
            cache_bucket_secs: 3600,
            jitter_min_ms: 100,
            jitter_max_ms: 500,
            accept_language: None,
            overall_deadline_secs: None,
            max_crawl_delay_secs: 60,
        }
    }
}

impl FetchConfig {
    /// Minimum spacing between two dispatches
    pub fn min_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.max_requests_per_second).unwrap_or(Duration::ZERO)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn overall_deadline(&self) -> Option<Duration> {
        self.overall_deadline_secs.map(Duration::from_secs)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_secs(self.max_crawl_delay_secs)
    }

    /// Total number of network attempts a fetch may make
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory where JSON results and backups are written
    #[serde(rename = "data-dir")]
    pub data_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

/// A single scrape target
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Site identifier (also the extractor lookup key)
    pub site: String,

    /// Output category the records are grouped under
    pub category: String,

    /// Page to fetch
    pub url: String,

    /// Optional selector for repeated record containers
    #[serde(default)]
    pub container: Option<String>,

    /// Field name to CSS selector
    pub selectors: BTreeMap<String, String>,
}
