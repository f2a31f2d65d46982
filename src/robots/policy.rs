//! Per-origin robots.txt policy with a process-lifetime cache

use crate::robots::{ParsedRobots, RobotsRecord};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use url::Url;

/// Caches and evaluates robots.txt directives, one record per origin
///
/// Records are fetched lazily on the first query for an origin. Any failure
/// to obtain robots.txt installs a permissive record, so an unreachable
/// directives file never blocks fetching, and the failure is not retried.
/// Two tasks racing on a new origin may both fetch robots.txt; the first
/// record stored wins.
#[derive(Debug)]
pub struct RobotsPolicy {
    client: Client,
    records: RwLock<HashMap<String, Arc<RobotsRecord>>>,
}

impl RobotsPolicy {
    /// Creates a policy that fetches robots.txt with the given client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Checks whether `user_agent` may fetch `url`
    ///
    /// Fetches and caches the origin's robots.txt on first use. URLs without
    /// a network origin are allowed.
    pub async fn can_fetch(&self, url: &Url, user_agent: &str) -> bool {
        let Some(record) = self.record_for(url).await else {
            return true;
        };

        let allowed = record.is_allowed(url.as_str(), user_agent);
        if !allowed {
            tracing::debug!("robots.txt for {} disallows {}", record.origin, url);
        }
        allowed
    }

    /// Crawl-delay from an already cached record; never fetches
    pub fn cached_crawl_delay(&self, url: &Url, user_agent: &str) -> Option<Duration> {
        let origin = origin_of(url)?;
        self.record(&origin)?.crawl_delay(user_agent)
    }

    /// Returns the cached record for an origin
    pub fn record(&self, origin: &str) -> Option<Arc<RobotsRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(origin)
            .cloned()
    }

    /// Installs directives for an origin without fetching them
    pub fn insert(&self, origin: &str, robots: ParsedRobots) {
        let record = Arc::new(RobotsRecord::new(origin, robots));
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(origin.to_string(), record);
    }

    /// Number of origins with a cached record
    pub fn cached_origins(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn record_for(&self, url: &Url) -> Option<Arc<RobotsRecord>> {
        let origin = origin_of(url)?;

        if let Some(record) = self.record(&origin) {
            return Some(record);
        }

        let fetched = Arc::new(self.fetch_record(&origin).await);
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(records.entry(origin).or_insert(fetched)))
    }

    /// Fetches `<origin>/robots.txt`, failing open on any error
    async fn fetch_record(&self, origin: &str) -> RobotsRecord {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching robots.txt: {}", robots_url);

        let response = match self.client.get(&robots_url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "Could not fetch {} ({}), allowing all paths for this origin",
                    robots_url,
                    e
                );
                return RobotsRecord::allow_all(origin);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::info!(
                "{} returned HTTP {}, allowing all paths for this origin",
                robots_url,
                status.as_u16()
            );
            return RobotsRecord::allow_all(origin);
        }

        match response.text().await {
            Ok(body) => RobotsRecord::new(origin, ParsedRobots::from_content(&body)),
            Err(e) => {
                tracing::warn!(
                    "Could not read {} ({}), allowing all paths for this origin",
                    robots_url,
                    e
                );
                RobotsRecord::allow_all(origin)
            }
        }
    }
}

/// Origin (scheme, host and non-default port) robots.txt is keyed by
///
/// Returns None for URLs without a network origin (`data:`, `file:`, ...).
pub fn origin_of(url: &Url) -> Option<String> {
    let origin = url.origin();
    if origin.is_tuple() {
        Some(origin.ascii_serialization())
    } else {
        None
    }
}
