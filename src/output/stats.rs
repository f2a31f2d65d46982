//! Run statistics
//!
//! This module collects what happened during one harvest run and displays it.

use crate::fetch::FetchStatsSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A target that produced no records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    /// Site id of the target
    pub site: String,

    /// Page that was requested
    pub url: String,

    /// Short failure kind (`retries_exhausted`, `disallowed`, `extract`, ...)
    pub kind: String,

    /// Human readable message
    pub message: String,
}

/// Summary of one harvest run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,

    /// Number of targets selected for the run
    pub targets: usize,

    /// Records saved per category
    pub records_by_category: BTreeMap<String, usize>,

    /// Engine counters at the end of the run
    pub fetch: FetchStatsSnapshot,

    pub errors: Vec<TargetFailure>,
}

impl RunSummary {
    pub fn total_records(&self) -> usize {
        self.records_by_category.values().sum()
    }

    /// Targets that did not fail
    pub fn succeeded_targets(&self) -> usize {
        self.targets.saturating_sub(self.errors.len())
    }

    /// Percentage of targets that did not fail
    pub fn success_rate(&self) -> f64 {
        if self.targets > 0 {
            (self.succeeded_targets() as f64 / self.targets as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Overview:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Duration: {:.1}s", summary.duration_seconds);
    println!("  Targets: {}", summary.targets);
    println!("  Total records: {}", summary.total_records());
    println!();

    if !summary.records_by_category.is_empty() {
        println!("Records by Category:");
        for (category, count) in &summary.records_by_category {
            println!("  {}: {}", category, count);
        }
        println!();
    }

    println!("Fetching:");
    println!("  Requests dispatched: {}", summary.fetch.requests);
    println!("  Cache hits: {}", summary.fetch.cache_hits);
    println!("  Disallowed by robots.txt: {}", summary.fetch.disallowed);
    println!("  Failed fetches: {}", summary.fetch.failures);
    println!();

    if !summary.errors.is_empty() {
        println!("Errors ({}):", summary.errors.len());
        for error in &summary.errors {
            println!("  - {} [{}] {}: {}", error.site, error.kind, error.url, error.message);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} targets)",
        summary.success_rate(),
        summary.succeeded_targets(),
        summary.targets
    );
}
