//! Per-origin robots.txt record
//!
//! A record is created the first time an origin is queried and kept for the
//! rest of the process; there is no staleness check or refetch.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Directives for one origin plus when they were obtained
#[derive(Debug, Clone)]
pub struct RobotsRecord {
    /// Origin the directives apply to (e.g. `https://example.test`)
    pub origin: String,

    /// The parsed robots.txt content
    pub robots: ParsedRobots,

    /// When the robots.txt was fetched (or the fail-open record created)
    pub fetched_at: DateTime<Utc>,
}

impl RobotsRecord {
    /// Creates a new record stamped with the current time
    pub fn new(origin: &str, robots: ParsedRobots) -> Self {
        Self {
            origin: origin.to_string(),
            robots,
            fetched_at: Utc::now(),
        }
    }

    /// Creates the permissive record installed when robots.txt is unavailable
    pub fn allow_all(origin: &str) -> Self {
        Self::new(origin, ParsedRobots::allow_all())
    }

    /// Checks if a URL is allowed according to the recorded directives
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.robots.is_allowed(url, user_agent)
    }

    /// Crawl-delay requested for the agent, if any
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        self.robots
            .crawl_delay(user_agent)
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }
}
