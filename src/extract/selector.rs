//! CSS-selector driven extractor

use crate::config::TargetConfig;
use crate::extract::{clean_text, Extractor, Record};
use crate::fetch::Page;
use crate::ExtractError;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Extracts named fields with CSS selectors
///
/// With a container selector, every matching element yields one record whose
/// fields are looked up inside it. Without one, the whole document yields a
/// single record. Each field takes the text of its first match; empty fields
/// are left out and records without any field are dropped.
#[derive(Debug)]
pub struct SelectorExtractor {
    site: String,
    container: Option<Selector>,
    fields: Vec<(String, Selector)>,
}

impl SelectorExtractor {
    /// Builds an extractor from a site id, optional container and field selectors
    pub fn new(
        site: &str,
        container: Option<&str>,
        fields: &BTreeMap<String, String>,
    ) -> Result<Self, ExtractError> {
        let container = container.map(parse_selector).transpose()?;
        let fields = fields
            .iter()
            .map(|(name, selector)| Ok((name.clone(), parse_selector(selector)?)))
            .collect::<Result<Vec<_>, ExtractError>>()?;

        Ok(Self {
            site: site.to_string(),
            container,
            fields,
        })
    }

    /// Builds an extractor from a configured target
    pub fn from_target(target: &TargetConfig) -> Result<Self, ExtractError> {
        Self::new(&target.site, target.container.as_deref(), &target.selectors)
    }

    fn extract_fields(&self, scope: ElementRef<'_>) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, selector)| {
                let text = scope
                    .select(selector)
                    .next()
                    .map(|element| clean_text(&element.text().collect::<String>()))?;
                (!text.is_empty()).then(|| (name.clone(), text))
            })
            .collect()
    }
}

impl Extractor for SelectorExtractor {
    fn site(&self) -> &str {
        &self.site
    }

    fn extract(&self, page: &Page) -> Result<Vec<Record>, ExtractError> {
        let document = Html::parse_document(&page.body);
        let fetched_at = Utc::now();

        let scopes: Vec<ElementRef<'_>> = match &self.container {
            Some(container) => document.select(container).collect(),
            None => vec![document.root_element()],
        };

        let records: Vec<Record> = scopes
            .into_iter()
            .map(|scope| self.extract_fields(scope))
            .filter(|fields| !fields.is_empty())
            .map(|fields| Record {
                site: self.site.clone(),
                source_url: page.url.clone(),
                fetched_at,
                fields,
            })
            .collect();

        tracing::debug!(
            "Extracted {} records for {} from {}",
            records.len(),
            self.site,
            page.url
        );

        Ok(records)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::Selector(selector.to_string()))
}
