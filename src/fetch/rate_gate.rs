//! Dispatch spacing shared by every fetch of an engine
//!
//! The gate holds a single timestamp: when the last request was allowed out.
//! Its async mutex stays locked across the sleep, so concurrent callers are
//! released one at a time and each sees the timestamp its predecessor wrote.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between permitted dispatches
#[derive(Debug)]
pub struct RateGate {
    /// Minimum spacing between two dispatches
    min_interval: Duration,

    /// When the last dispatch was permitted
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Creates a gate allowing at most `max_requests_per_second` dispatches
    ///
    /// A non-positive or non-finite rate yields a gate with no spacing.
    pub fn new(max_requests_per_second: f64) -> Self {
        let min_interval =
            Duration::try_from_secs_f64(1.0 / max_requests_per_second).unwrap_or(Duration::ZERO);
        Self::with_interval(min_interval)
    }

    /// Creates a gate with an explicit minimum interval
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the minimum interval has passed since the last dispatch,
    /// then records now as the new dispatch time
    pub async fn wait(&self) {
        self.wait_with_floor(Duration::ZERO).await;
    }

    /// Like `wait`, but spacing is at least `floor` when that exceeds the
    /// configured interval (used for robots.txt `Crawl-delay`)
    pub async fn wait_with_floor(&self, floor: Duration) {
        let spacing = self.min_interval.max(floor);
        let mut last = self.last_dispatch.lock().await;

        if let Some(wait) = time_until_next_dispatch(*last, spacing, Instant::now()) {
            tracing::debug!("Rate gate holding dispatch for {:?}", wait);
            tokio::time::sleep(wait).await;
        }

        *last = Some(Instant::now());
    }
}

/// Time left before the next dispatch may go out, or None if it may go now
fn time_until_next_dispatch(
    last: Option<Instant>,
    spacing: Duration,
    now: Instant,
) -> Option<Duration> {
    let last = last?;
    let elapsed = now.saturating_duration_since(last);
    if elapsed < spacing {
        Some(spacing - elapsed)
    } else {
        None
    }
}
