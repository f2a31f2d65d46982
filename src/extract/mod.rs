//! Extraction of records from fetched pages
//!
//! Each target site is served by an `Extractor`, looked up by site id in an
//! `ExtractorRegistry`. The bundled `SelectorExtractor` maps configured CSS
//! selectors to named string fields; it knows nothing about what the fields
//! mean.

mod registry;
mod selector;

pub use registry::ExtractorRegistry;
pub use selector::SelectorExtractor;

use crate::fetch::Page;
use crate::ExtractError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One extracted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Site id of the extractor that produced the record
    pub site: String,

    /// Page the record was extracted from
    pub source_url: String,

    /// When the record was extracted
    pub fetched_at: DateTime<Utc>,

    /// Field name to cleaned text
    pub fields: BTreeMap<String, String>,
}

/// Capability to turn raw page content into records for one site
pub trait Extractor: Send + Sync {
    /// Site id this extractor is registered under
    fn site(&self) -> &str;

    /// Extracts records from a fetched page
    fn extract(&self, page: &Page) -> Result<Vec<Record>, ExtractError>;
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
