use crate::config::TargetConfig;
use crate::extract::{Extractor, SelectorExtractor};
use crate::ExtractError;
use std::collections::HashMap;

/// Extractors keyed by site id
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selector extractor for every configured target
    pub fn from_targets(targets: &[TargetConfig]) -> Result<Self, ExtractError> {
        let mut registry = Self::new();
        for target in targets {
            registry.register(Box::new(SelectorExtractor::from_target(target)?));
        }
        Ok(registry)
    }

    /// Adds an extractor, replacing any previous one for the same site
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        let site = extractor.site().to_string();
        if self.extractors.insert(site.clone(), extractor).is_some() {
            tracing::debug!("Replaced extractor for site: {}", site);
        }
    }

    pub fn get(&self, site: &str) -> Result<&dyn Extractor, ExtractError> {
        self.extractors
            .get(site)
            .map(|extractor| extractor.as_ref())
            .ok_or_else(|| ExtractError::MissingExtractor(site.to_string()))
    }

    pub fn sites(&self) -> Vec<&str> {
        let mut sites: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        sites.sort_unstable();
        sites
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("sites", &self.sites())
            .finish()
    }
}
