use crate::config::types::{Config, FetchConfig, OutputConfig, TargetConfig};
use crate::ConfigError;
use reqwest::header::HeaderValue;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates fetch engine configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if !config.max_requests_per_second.is_finite() || config.max_requests_per_second <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "max_requests_per_second must be a positive number, got {}",
            config.max_requests_per_second
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if HeaderValue::from_str(&config.user_agent).is_err() {
        return Err(ConfigError::Validation(format!(
            "user_agent is not a valid header value: '{}'",
            config.user_agent
        )));
    }

    if let Some(language) = &config.accept_language {
        if HeaderValue::from_str(language).is_err() {
            return Err(ConfigError::Validation(format!(
                "accept_language is not a valid header value: '{}'",
                language
            )));
        }
    }

    if config.request_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 1, got {}",
            config.request_timeout_ms
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.cache_bucket_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "cache_bucket_secs must be >= 1, got {}",
            config.cache_bucket_secs
        )));
    }

    if config.jitter_min_ms > config.jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "jitter_min_ms ({}) must not exceed jitter_max_ms ({})",
            config.jitter_min_ms, config.jitter_max_ms
        )));
    }

    if config.overall_deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "overall_deadline_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates scrape targets
fn validate_targets(targets: &[TargetConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for target in targets {
        validate_site_id(&target.site)?;

        if !seen.insert(target.site.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate target site '{}'",
                target.site
            )));
        }

        if target.category.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Target '{}' must have a category",
                target.site
            )));
        }

        let url = Url::parse(&target.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid target URL '{}': {}", target.url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Target URL '{}' must use http or https",
                target.url
            )));
        }

        if target.selectors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Target '{}' must define at least one selector",
                target.site
            )));
        }

        let selectors = target.container.iter().chain(target.selectors.values());
        for selector in selectors {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::InvalidSelector {
                    site: target.site.clone(),
                    selector: selector.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a site identifier: non-empty, alphanumeric plus `-` and `_`
fn validate_site_id(site: &str) -> Result<(), ConfigError> {
    if site.is_empty() {
        return Err(ConfigError::Validation(
            "Target site cannot be empty".to_string(),
        ));
    }

    if !site
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "Target site must contain only alphanumeric characters, '-' or '_', got '{}'",
            site
        )));
    }

    Ok(())
}
