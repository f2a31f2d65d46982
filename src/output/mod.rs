//! Output module for persisting harvested records and run summaries
//!
//! This module handles:
//! - Writing records as JSON with metadata and automatic backups
//! - Recording and printing run statistics

mod stats;
mod store;

pub use stats::{print_summary, RunSummary, TargetFailure};
pub use store::{DataStore, BACKUP_DIR};
