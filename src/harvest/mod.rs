//! Harvest runs
//!
//! A harvest run fetches every selected target through one shared
//! `FetchEngine`, extracts records with the registered extractors and saves
//! them grouped by category.

mod coordinator;

pub use coordinator::{Coordinator, TargetFilter, METRICS_FILE};
