//! Harvest coordinator - run orchestration
//!
//! This module ties the pieces of a run together:
//! - Selecting targets by category and site
//! - Fetching them concurrently through the shared engine
//! - Extracting records and grouping them by category
//! - Saving one JSON file per category plus the run metrics

use crate::config::{Config, TargetConfig};
use crate::extract::{ExtractorRegistry, Record};
use crate::fetch::FetchEngine;
use crate::output::{DataStore, RunSummary, TargetFailure};
use crate::Result;
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

/// File the run summary is saved under
pub const METRICS_FILE: &str = "run_metrics.json";

/// Restricts a run to some categories and/or sites
///
/// An empty list places no restriction on that dimension.
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    pub categories: Vec<String>,
    pub sites: Vec<String>,
}

impl TargetFilter {
    /// Filter that selects every target
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, target: &TargetConfig) -> bool {
        (self.categories.is_empty() || self.categories.contains(&target.category))
            && (self.sites.is_empty() || self.sites.contains(&target.site))
    }
}

/// Main harvest coordinator structure
pub struct Coordinator {
    engine: Arc<FetchEngine>,
    registry: ExtractorRegistry,
    targets: Vec<TargetConfig>,
    store: DataStore,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Engine, extractors and data directory are ready
    /// * `Err(PoliteError)` - The client, an extractor or the store failed to initialize
    pub fn new(config: Config) -> Result<Self> {
        let engine = Arc::new(FetchEngine::new(config.fetch)?);
        let registry = ExtractorRegistry::from_targets(&config.targets)?;
        let store = DataStore::new(&config.output.data_dir)?;

        Ok(Self::with_parts(engine, registry, config.targets, store))
    }

    /// Creates a coordinator from already built parts
    pub fn with_parts(
        engine: Arc<FetchEngine>,
        registry: ExtractorRegistry,
        targets: Vec<TargetConfig>,
        store: DataStore,
    ) -> Self {
        Self {
            engine,
            registry,
            targets,
            store,
        }
    }

    pub fn engine(&self) -> &Arc<FetchEngine> {
        &self.engine
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Targets a run with this filter would harvest
    pub fn selected(&self, filter: &TargetFilter) -> Vec<&TargetConfig> {
        self.targets.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Runs one harvest over the selected targets
    ///
    /// A failing target is recorded in the summary and never stops the others.
    /// Only storage failures abort the run.
    pub async fn run(&self, filter: &TargetFilter) -> Result<RunSummary> {
        let started_at = Utc::now();
        let selected = self.selected(filter);
        tracing::info!("Starting harvest of {} targets", selected.len());

        let results = join_all(selected.iter().map(|target| self.harvest_target(target))).await;

        let mut by_category: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        let mut errors = Vec::new();
        for (target, result) in selected.iter().zip(results) {
            match result {
                Ok(records) => by_category
                    .entry(target.category.clone())
                    .or_default()
                    .extend(records),
                Err(failure) => errors.push(failure),
            }
        }

        let mut records_by_category = BTreeMap::new();
        for (category, records) in &by_category {
            if records.is_empty() {
                tracing::warn!("No records extracted for category: {}", category);
                continue;
            }
            self.store.save(&format!("{}.json", category), records)?;
            records_by_category.insert(category.clone(), records.len());
        }

        let finished_at = Utc::now();
        let summary = RunSummary {
            started_at,
            finished_at,
            duration_seconds: (finished_at - started_at).num_milliseconds() as f64 / 1000.0,
            targets: selected.len(),
            records_by_category,
            fetch: self.engine.stats(),
            errors,
        };
        self.store.save(METRICS_FILE, std::slice::from_ref(&summary))?;

        tracing::info!(
            "Harvest completed: {} records, {} errors in {:.1}s",
            summary.total_records(),
            summary.errors.len(),
            summary.duration_seconds
        );

        Ok(summary)
    }

    /// Fetches and extracts one target
    async fn harvest_target(
        &self,
        target: &TargetConfig,
    ) -> std::result::Result<Vec<Record>, TargetFailure> {
        let failure = |kind: &str, message: String| TargetFailure {
            site: target.site.clone(),
            url: target.url.clone(),
            kind: kind.to_string(),
            message,
        };

        let extractor = self
            .registry
            .get(&target.site)
            .map_err(|e| failure("extract", e.to_string()))?;

        let page = self
            .engine
            .fetch(&target.url)
            .await
            .map_err(|e| failure(e.kind(), e.to_string()))?;

        let records = extractor.extract(&page).map_err(|e| {
            tracing::error!("Extraction failed for {}: {}", target.site, e);
            failure("extract", e.to_string())
        })?;

        if records.is_empty() {
            tracing::warn!("No records found for {} at {}", target.site, target.url);
        } else {
            tracing::info!("{}: {} records", target.site, records.len());
        }

        Ok(records)
    }
}
