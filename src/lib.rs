//! Polite-Fetch: a courteous page fetcher for scheduled scraping
//!
//! This crate fetches web pages while respecting rate limits, robots.txt
//! directives and retry back-off, then hands the raw content to pluggable
//! selector-based extractors and stores the resulting records as JSON.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod output;
pub mod robots;

use thiserror::Error;

/// Main error type for Polite-Fetch operations
#[derive(Debug, Error)]
pub enum PoliteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for site '{site}': {selector}")]
    InvalidSelector { site: String, selector: String },
}

/// Extraction-specific errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("No extractor registered for site '{0}'")]
    MissingExtractor(String),
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Polite-Fetch operations
pub type Result<T> = std::result::Result<T, PoliteError>;

// Re-export commonly used types
pub use config::{Config, FetchConfig};
pub use fetch::{FetchEngine, FetchError, FetchOutcome, Page};
pub use robots::RobotsPolicy;
