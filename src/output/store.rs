//! JSON persistence with automatic backups

use crate::StoreError;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name for backups, relative to the data directory
pub const BACKUP_DIR: &str = "backups";

/// Envelope written around every saved record list
#[derive(Debug, Serialize)]
struct Envelope<'a, T> {
    data: &'a [T],
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
struct Metadata {
    last_updated: DateTime<Utc>,
    total_records: usize,
    scraper_version: &'static str,
}

/// Writes named JSON files under a data directory
///
/// Saving over an existing file first copies it to
/// `backups/<name>_<YYYYmmdd_HHMMSS>`.
#[derive(Debug, Clone)]
pub struct DataStore {
    data_dir: PathBuf,
}

impl DataStore {
    /// Opens a store, creating the data and backup directories as needed
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(data_dir.join(BACKUP_DIR))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR)
    }

    /// Saves records with metadata, returning the written path
    pub fn save<T: Serialize>(&self, name: &str, records: &[T]) -> Result<PathBuf, StoreError> {
        let envelope = Envelope {
            data: records,
            metadata: Metadata {
                last_updated: Utc::now(),
                total_records: records.len(),
                scraper_version: env!("CARGO_PKG_VERSION"),
            },
        };
        let path = self.write_json(name, &envelope)?;
        tracing::info!("Saved {} records to {}", records.len(), path.display());
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, StoreError> {
        self.backup(name)?;

        let path = self.data_dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Copies the current file to the backup directory, if it exists
    fn backup(&self, name: &str) -> Result<Option<PathBuf>, StoreError> {
        let source = self.data_dir.join(name);
        if !source.exists() {
            return Ok(None);
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let backup = self.backup_dir().join(format!("{}_{}", name, timestamp));
        fs::copy(&source, &backup)?;
        tracing::info!("Backup created: {}", backup.display());
        Ok(Some(backup))
    }
}
