//! Generation selection.
//!
//! A request may name a generation. Anything that does not name a known
//! active generation (absent, non-numeric, unknown, inactive) falls back to
//! the current one: a bad generation parameter never fails a request.

use crate::error::{ResolveError, Result};
use crate::resolver::PostcodeResolver;
use postcode_spatial::{Generation, GenerationId};

/// The highest active generation.
pub fn current_generation(generations: &[Generation]) -> Option<&Generation> {
    generations
        .iter()
        .filter(|g| g.active)
        .max_by_key(|g| g.id)
}

/// Pick the generation a request runs against.
pub fn select_generation<'a>(
    requested: Option<&str>,
    generations: &'a [Generation],
) -> Option<&'a Generation> {
    let named = requested
        .and_then(|raw| raw.trim().parse::<GenerationId>().ok())
        .and_then(|id| generations.iter().find(|g| g.id == id && g.active));

    if named.is_none() {
        if let Some(raw) = requested {
            tracing::debug!(requested = raw, "unusable generation, using current");
        }
    }
    named.or_else(|| current_generation(generations))
}

impl PostcodeResolver {
    /// The current generation.
    pub async fn current_generation(&self) -> Result<Generation> {
        self.resolve_generation(None).await
    }

    /// The generation a request naming `requested` runs against.
    pub async fn resolve_generation(&self, requested: Option<&str>) -> Result<Generation> {
        let generations = self
            .bounded(self.store().generations())
            .await
            .or_not_found(|| ResolveError::not_found("No active generation"))?;
        select_generation(requested, &generations)
            .cloned()
            .ok_or_else(|| ResolveError::not_found("No active generation"))
    }
}
