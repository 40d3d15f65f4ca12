//! Full postcode lookup.

use crate::error::{ResolveError, Result};
use crate::output::PostcodeResult;
use crate::resolver::PostcodeResolver;
use crate::shortcuts::{build_shortcuts, ShortcutIndex};
use crate::validate::validate_full;
use postcode_spatial::Versioned;
use tracing::Instrument;

impl PostcodeResolver {
    /// Look up a postcode and everything it resolves to.
    ///
    /// The input is canonicalised by the configured rules and validated
    /// before any query runs. `generation` is the caller's raw generation
    /// parameter; see [`select_generation`](crate::select_generation).
    ///
    /// Shortcuts are built from the directly resolved areas, so the
    /// supplemental areas never contribute to them.
    pub async fn lookup_postcode(
        &self,
        raw: &str,
        generation: Option<&str>,
    ) -> Result<PostcodeResult> {
        let span = tracing::debug_span!(
            "postcode_lookup",
            postcode = tracing::field::Empty,
            generation = tracing::field::Empty,
        );
        async {
            let canonical = self.rules().canonicalise(raw);
            let code = validate_full(&canonical)?;
            tracing::Span::current().record("postcode", code.as_str());

            let not_found = || ResolveError::not_found(format!("Postcode '{code}' not found"));
            let postcode = self
                .bounded(self.store().postcode(&code))
                .await
                .flatten()
                .or_not_found(not_found)?;

            let generation = self.resolve_generation(generation).await?;
            tracing::Span::current().record("generation", generation.id);
            if !postcode.visible_at(generation.id) {
                return Err(not_found());
            }

            let parts = self.resolve_area_parts(&postcode, generation.id).await?;
            let shortcuts = if self.config().include_shortcuts {
                build_shortcuts(&parts.direct)
            } else {
                ShortcutIndex::default()
            };
            let areas = parts.into_areas();

            Ok(PostcodeResult::new(&postcode, &areas, shortcuts))
        }
        .instrument(span)
        .await
    }
}
