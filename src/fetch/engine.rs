//! The polite fetch engine
//!
//! # Request Flow
//!
//! 1. robots.txt check (when enabled): a denial returns `Disallowed` at once
//! 2. Response cache lookup: a hit returns the cached body at once
//! 3. Up to `max_retries + 1` attempts, each going through:
//!    - the rate gate (spacing shared by every fetch of this engine)
//!    - a random jitter delay
//!    - one GET with the configured timeout
//! 4. A 200 is cached and returned; anything else backs off for
//!    `retry_delay * 2^attempt` before the next attempt
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 200 | Cache, return content |
//! | HTTP 429 | Back off, retry |
//! | Other HTTP status | Back off, retry |
//! | Timeout | Back off, retry |
//! | Connection/DNS/TLS error | Back off, retry |
//! | Attempts exhausted | `RetriesExhausted` with the last error |
//! | Overall deadline passed | `DeadlineExceeded`, no further attempts |
//!
//! The deadline is checked before entering the gate and again just before
//! dispatch, so a long gate wait never leads to a late request.

use crate::config::FetchConfig;
use crate::fetch::attempt::{RetryDecision, RetryMachine};
use crate::fetch::{build_http_client, FetchError, FetchOutcome, Page, RateGate, ResponseCache};
use crate::robots::RobotsPolicy;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Counters across every fetch made by one engine
#[derive(Debug, Default)]
pub struct FetchStats {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    cache_hits: AtomicU64,
    disallowed: AtomicU64,
}

/// Point-in-time copy of `FetchStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatsSnapshot {
    /// Network requests dispatched (every attempt counts)
    pub requests: u64,
    /// Fetches that returned content from the network
    pub successes: u64,
    /// Fetches that ended without content (robots denials excluded)
    pub failures: u64,
    /// Fetches served from the response cache
    pub cache_hits: u64,
    /// Fetches vetoed by robots.txt
    pub disallowed: u64,
}

impl FetchStats {
    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            disallowed: self.disallowed.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Decides whether and when each requested URL hits the network
///
/// The engine is `Send + Sync`; share it behind an `Arc` to run several
/// fetches concurrently. All of them pass through the same rate gate.
#[derive(Debug)]
pub struct FetchEngine {
    config: FetchConfig,
    client: Client,
    gate: RateGate,
    robots: RobotsPolicy,
    cache: ResponseCache,
    stats: FetchStats,
}

impl FetchEngine {
    /// Creates an engine with a client built from the configuration
    pub fn new(config: FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self::with_client(config, client))
    }

    /// Creates an engine around an existing client
    pub fn with_client(config: FetchConfig, client: Client) -> Self {
        Self {
            gate: RateGate::with_interval(config.min_interval()),
            robots: RobotsPolicy::new(client.clone()),
            cache: ResponseCache::new(config.cache_bucket_secs),
            stats: FetchStats::default(),
            client,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn robots(&self) -> &RobotsPolicy {
        &self.robots
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn stats(&self) -> FetchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Fetches a URL politely
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - Content from the network or the response cache
    /// * `Err(FetchError::Disallowed)` - robots.txt forbids the URL
    /// * `Err(FetchError::RetriesExhausted)` - Every attempt failed
    /// * `Err(FetchError::DeadlineExceeded)` - The overall deadline ran out
    /// * `Err(FetchError::InvalidUrl)` - The URL could not be parsed
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let started = Instant::now();

        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if self.config.respect_robots_txt
            && !self.robots.can_fetch(&parsed, &self.config.user_agent).await
        {
            tracing::warn!("robots.txt disallows fetching: {}", url);
            FetchStats::bump(&self.stats.disallowed);
            return Err(FetchError::Disallowed {
                url: url.to_string(),
            });
        }

        if let Some(body) = self.cache.get(url) {
            tracing::info!("Using cached content for: {}", url);
            FetchStats::bump(&self.stats.cache_hits);
            return Ok(Page {
                url: url.to_string(),
                body,
                attempts: 0,
                from_cache: true,
            });
        }

        let crawl_delay = self.crawl_delay_floor(&parsed);

        let mut machine = RetryMachine::new(url, self.config.max_attempts(), self.config.retry_delay());

        let error = loop {
            if self.deadline_passed(started) {
                break machine.abandon();
            }

            machine.gate();
            self.gate.wait_with_floor(crawl_delay).await;
            self.jitter().await;

            if self.deadline_passed(started) {
                break machine.abandon();
            }

            machine.dispatch();
            tracing::info!("Fetching: {} (attempt {})", url, machine.attempts());
            FetchStats::bump(&self.stats.requests);

            let error = match self.dispatch(&parsed).await {
                Ok(body) => {
                    machine.succeed();
                    self.cache.put(url, body.clone());
                    FetchStats::bump(&self.stats.successes);
                    return Ok(Page {
                        url: url.to_string(),
                        body,
                        attempts: machine.attempts(),
                        from_cache: false,
                    });
                }
                Err(error) => error,
            };

            tracing::warn!("{} for {} (attempt {})", error, url, machine.attempts());

            match machine.fail(error) {
                RetryDecision::BackOff(delay) => {
                    let delay = self.clamp_to_deadline(started, delay);
                    tracing::info!("Retrying {} in {:?}", url, delay);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp(error) => break error,
            }
        };

        tracing::error!("Failed to fetch {}: {}", url, error);
        FetchStats::bump(&self.stats.failures);
        Err(error)
    }

    /// Issues one GET and classifies the response
    async fn dispatch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| FetchError::from_transport(&e))?;

        match response.status() {
            StatusCode::OK => response
                .text()
                .await
                .map_err(|e| FetchError::from_transport(&e)),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::Throttled),
            status => Err(FetchError::HttpError(status.as_u16())),
        }
    }

    /// Gate spacing requested by the origin's cached robots.txt, capped by
    /// `max_crawl_delay` since the gate is shared with every other origin
    fn crawl_delay_floor(&self, url: &Url) -> Duration {
        match self.robots.cached_crawl_delay(url, &self.config.user_agent) {
            Some(delay) if delay > self.config.max_crawl_delay() => {
                tracing::warn!(
                    "Crawl-delay of {:?} for {} capped to {:?}",
                    delay,
                    url,
                    self.config.max_crawl_delay()
                );
                self.config.max_crawl_delay()
            }
            Some(delay) => delay,
            None => Duration::ZERO,
        }
    }

    /// Random pause before dispatch so requests are not perfectly periodic
    async fn jitter(&self) {
        let (min, max) = (self.config.jitter_min_ms, self.config.jitter_max_ms);
        if max == 0 {
            return;
        }
        let millis = rand::thread_rng().gen_range(min.min(max)..=max);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    fn deadline_passed(&self, started: Instant) -> bool {
        self.config
            .overall_deadline()
            .is_some_and(|deadline| started.elapsed() >= deadline)
    }

    /// Shortens a back-off so it ends no later than the overall deadline
    fn clamp_to_deadline(&self, started: Instant, delay: Duration) -> Duration {
        match self.config.overall_deadline() {
            Some(deadline) => delay.min(deadline.saturating_sub(started.elapsed())),
            None => delay,
        }
    }
}
