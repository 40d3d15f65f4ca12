//! The resolution engine.

use crate::config::ResolverConfig;
use crate::deadline::{run_bounded, QueryOutcome};
use crate::rules::{DefaultRules, PostcodeRules};
use postcode_spatial::SpatialProvider;
use std::future::Future;
use std::sync::Arc;

/// Postcode and point resolution over a shared spatial store.
///
/// Cheap to clone; clones share the store and rules. Every operation is
/// read-only and may run concurrently with any other.
#[derive(Clone)]
pub struct PostcodeResolver {
    store: Arc<dyn SpatialProvider>,
    rules: Arc<dyn PostcodeRules>,
    config: ResolverConfig,
}

impl PostcodeResolver {
    /// Create a resolver with [`DefaultRules`].
    pub fn new(store: Arc<dyn SpatialProvider>, config: ResolverConfig) -> Self {
        Self {
            store,
            rules: Arc::new(DefaultRules),
            config,
        }
    }

    /// Replace the postcode rules.
    pub fn with_rules(mut self, rules: impl PostcodeRules + 'static) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SpatialProvider> {
        &self.store
    }

    pub fn rules(&self) -> &dyn PostcodeRules {
        self.rules.as_ref()
    }

    /// Canonical form of a submitted postcode, or `None` if nothing usable
    /// was submitted.
    pub fn canonical_form_postcode(&self, raw: &str) -> Option<String> {
        let canonical = self.rules.canonicalise(raw);
        if canonical.trim().is_empty() {
            None
        } else {
            Some(canonical)
        }
    }

    pub(crate) async fn bounded<T, F>(&self, query: F) -> QueryOutcome<T>
    where
        F: Future<Output = postcode_spatial::Result<T>>,
    {
        run_bounded(self.config.query_timeout(), query).await
    }
}
