//! Example postcode for an area.
//!
//! Two tiers. The membership relation is cheap, so it is tried first and
//! anything short of a hit moves on. The containment scan behind it is
//! expensive: a timeout there is reported, while any other failure just
//! means there is no example to give.

use crate::deadline::QueryOutcome;
use crate::error::{ResolveError, Result};
use crate::resolver::PostcodeResolver;
use crate::validate::display_postcode;
use postcode_spatial::{Area, AreaId, GenerationId};
use tracing::Instrument;

/// The generation closest to `current` in which `area` exists.
///
/// An area retired before the current generation is searched in its last
/// generation, so its own member postcodes are still found.
pub(crate) fn example_generation(area: &Area, current: GenerationId) -> GenerationId {
    let first = area.validity.start;
    let last = area
        .validity
        .end
        .map_or(GenerationId::MAX, |end| end.saturating_sub(1))
        .max(first);
    current.clamp(first, last)
}

impl PostcodeResolver {
    /// A postcode in the area, in display form, or `None` if none is found.
    ///
    /// Both tiers search the current generation, or the generation nearest
    /// to it in which the area exists.
    pub async fn example_postcode(&self, area_id: AreaId) -> Result<Option<String>> {
        let span = tracing::debug_span!(
            "example_postcode",
            area_id,
            generation = tracing::field::Empty,
            tier = tracing::field::Empty,
        );
        async {
            let area = self
                .bounded(self.store().area(area_id))
                .await
                .flatten()
                .or_not_found(|| ResolveError::not_found(format!("Area {area_id} not found")))?;
            let current = self.current_generation().await?;
            let generation = example_generation(&area, current.id);
            tracing::Span::current().record("generation", generation);

            match self
                .bounded(self.store().member_postcode(area.id, generation))
                .await
                .flatten()
            {
                QueryOutcome::Found(postcode) => {
                    tracing::Span::current().record("tier", "membership");
                    return Ok(Some(display_postcode(&postcode.code)));
                }
                QueryOutcome::Empty => {
                    tracing::debug!("no member postcode, trying containment");
                }
                QueryOutcome::TimedOut { elapsed } => {
                    tracing::debug!(?elapsed, "membership lookup timed out, trying containment");
                }
                QueryOutcome::Failed(err) => {
                    tracing::debug!(error = %err, "membership lookup failed, trying containment");
                }
            }

            tracing::Span::current().record("tier", "containment");
            match self
                .bounded(self.store().postcodes_within_area(area.id, generation, 1))
                .await
            {
                QueryOutcome::Found(postcodes) => {
                    Ok(postcodes.first().map(|pc| display_postcode(&pc.code)))
                }
                QueryOutcome::Empty => Ok(None),
                QueryOutcome::TimedOut { elapsed } => Err(ResolveError::QueryTimeout { elapsed }),
                QueryOutcome::Failed(err) => {
                    tracing::warn!(error = %err, "containment lookup failed, no example");
                    Ok(None)
                }
            }
        }
        .instrument(span)
        .await
    }
}
