//! Response cache keyed by URL and coarse time bucket
//!
//! Entries "expire" when the wall clock crosses a bucket boundary: a lookup
//! only matches entries stored under the current bucket. When a store lands in
//! a newer bucket, entries from older buckets are dropped since no lookup can
//! reach them again.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Cache key: the URL plus the bucket it was stored under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: String,
    bucket: i64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, String>,
    newest_bucket: Option<i64>,
}

/// Short-lived memoization of fetched page content
#[derive(Debug)]
pub struct ResponseCache {
    /// Bucket width in seconds
    bucket_secs: i64,
    inner: Mutex<CacheInner>,
}

impl ResponseCache {
    /// Creates a cache with the given bucket width (seconds, minimum 1)
    pub fn new(bucket_secs: u64) -> Self {
        Self {
            bucket_secs: i64::try_from(bucket_secs.max(1)).unwrap_or(i64::MAX),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Looks up content for `url` in the current bucket
    pub fn get(&self, url: &str) -> Option<String> {
        self.get_at(url, Utc::now())
    }

    /// Stores content for `url` in the current bucket
    pub fn put(&self, url: &str, content: String) {
        self.put_at(url, content, Utc::now());
    }

    /// Looks up content for `url` in the bucket containing `now`
    pub fn get_at(&self, url: &str, now: DateTime<Utc>) -> Option<String> {
        let key = CacheKey {
            url: url.to_string(),
            bucket: self.bucket_of(now),
        };
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(&key).cloned()
    }

    /// Stores content for `url` in the bucket containing `now`
    pub fn put_at(&self, url: &str, content: String, now: DateTime<Utc>) {
        let bucket = self.bucket_of(now);
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if inner.newest_bucket.map_or(true, |newest| bucket > newest) {
            let before = inner.entries.len();
            inner.entries.retain(|key, _| key.bucket >= bucket);
            let swept = before - inner.entries.len();
            if swept > 0 {
                tracing::debug!("Swept {} stale cache entries", swept);
            }
            inner.newest_bucket = Some(bucket);
        }

        inner.entries.insert(
            CacheKey {
                url: url.to_string(),
                bucket,
            },
            content,
        );
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buckets are cut on the Unix epoch, i.e. in UTC; with a non-whole-hour
    /// local offset an hourly bucket does not line up with the local hour
    fn bucket_of(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.bucket_secs)
    }
}
