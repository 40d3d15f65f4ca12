//! Resolver configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deadline for each store query, in milliseconds.
    pub query_timeout_ms: u64,

    /// Candidates fetched by centroid distance before exact re-ranking.
    pub nearest_candidates: usize,

    /// Build the shortcut index for postcode lookups.
    pub include_shortcuts: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5_000, // 5 seconds
            nearest_candidates: 100,
            include_shortcuts: true,
        }
    }
}

impl ResolverConfig {
    /// Set the per-query deadline.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the number of nearest-search candidates, at least one.
    pub fn with_nearest_candidates(mut self, k: usize) -> Self {
        self.nearest_candidates = k.max(1);
        self
    }

    /// Enable or disable the shortcut index.
    pub fn with_shortcuts(mut self, enabled: bool) -> Self {
        self.include_shortcuts = enabled;
        self
    }

    /// Per-query deadline.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Candidates to fetch for a nearest search. A configured zero would
    /// make every search come back empty, so it counts as one.
    pub fn nearest_k(&self) -> usize {
        self.nearest_candidates.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
        assert_eq!(config.nearest_candidates, 100);
        assert!(config.include_shortcuts);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ResolverConfig = serde_json::from_str(r#"{"query_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.query_timeout(), Duration::from_millis(250));
        assert_eq!(config.nearest_candidates, 100);
    }

    #[test]
    fn test_builders() {
        let config = ResolverConfig::default()
            .with_query_timeout(Duration::from_millis(40))
            .with_nearest_candidates(10)
            .with_shortcuts(false);
        assert_eq!(config.query_timeout_ms, 40);
        assert_eq!(config.nearest_candidates, 10);
        assert!(!config.include_shortcuts);
    }

    #[test]
    fn test_zero_candidates_means_one() {
        let config = ResolverConfig::default().with_nearest_candidates(0);
        assert_eq!(config.nearest_candidates, 1);

        let config: ResolverConfig =
            serde_json::from_str(r#"{"nearest_candidates": 0}"#).unwrap();
        assert_eq!(config.nearest_k(), 1);
        assert_eq!(ResolverConfig::default().nearest_k(), 100);
    }
}
