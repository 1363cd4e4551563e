//! Ordered backend candidate list.
//!
//! # Responsibilities
//! - Merge the explicit backend URL with the static fallbacks
//! - Drop blank entries and duplicates, keeping first occurrence
//! - Normalize trailing slashes so `base + path` never doubles up

use std::sync::Arc;

use crate::config::BackendConfig;

/// Backend base URLs in attempt order.
///
/// Cheap to clone and immutable once resolved, so concurrent requests read it
/// without synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendCandidates {
    bases: Arc<[String]>,
}

impl BackendCandidates {
    /// Resolve candidates from an explicit URL (highest priority) followed by
    /// the fallbacks, in order.
    ///
    /// Never fails. The result is empty when every source is blank.
    pub fn resolve(explicit: Option<&str>, fallbacks: &[String]) -> Self {
        let mut bases: Vec<String> = Vec::with_capacity(fallbacks.len() + 1);

        let sources = explicit
            .into_iter()
            .chain(fallbacks.iter().map(String::as_str));
        for raw in sources {
            let Some(base) = normalize(raw) else {
                continue;
            };
            if !bases.contains(&base) {
                bases.push(base);
            }
        }

        Self {
            bases: bases.into(),
        }
    }

    /// Resolve candidates from the backend section of the configuration.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::resolve(config.url.as_deref(), &config.fallback_urls)
    }

    /// Iterate over base URLs in attempt order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.bases.iter().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.bases.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallbacks(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_explicit_url_comes_first() {
        let candidates = BackendCandidates::resolve(
            Some("http://api:9000"),
            &fallbacks(&["http://localhost:8000", "http://backend:8000"]),
        );
        let order: Vec<&str> = candidates.iter().collect();
        assert_eq!(
            order,
            vec!["http://api:9000", "http://localhost:8000", "http://backend:8000"]
        );
    }

    #[test]
    fn test_duplicates_and_blanks_removed() {
        let candidates = BackendCandidates::resolve(
            Some("http://localhost:8000/"),
            &fallbacks(&["", "  ", "http://localhost:8000", "http://backend:8000"]),
        );
        let order: Vec<&str> = candidates.iter().collect();
        assert_eq!(order, vec!["http://localhost:8000", "http://backend:8000"]);
    }

    #[test]
    fn test_all_sources_empty() {
        let candidates = BackendCandidates::resolve(Some(""), &fallbacks(&["/"]));
        assert!(candidates.is_empty());
        assert_eq!(candidates.get(0), None);
    }

    #[test]
    fn test_resolution_is_stable() {
        let config = BackendConfig::default();
        let first = BackendCandidates::from_config(&config);
        let second = BackendCandidates::from_config(&config);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
