//! Area resolution.
//!
//! The areas of a postcode are those whose boundary contains its location,
//! plus those linked to it through the membership relation, plus the
//! supplemental areas implied by their types. Everything is filtered to one
//! generation and deduplicated by id, keeping the first occurrence.

use crate::error::Result;
use crate::resolver::PostcodeResolver;
use postcode_spatial::{dedup_keep_first, Area, AreaId, GenerationId, Postcode};
use tracing::Instrument;

pub const WMP_AREA_ID: AreaId = 900000;
pub const EUP_AREA_ID: AreaId = 900001;
pub const LAE_AREA_ID: AreaId = 900002;
pub const SPA_AREA_ID: AreaId = 900003;
pub const WAS_AREA_ID: AreaId = 900004;
pub const NIA_AREA_ID: AreaId = 900005;
pub const LAS_AREA_ID: AreaId = 900006;

/// Areas that enclose every area of a type but have no boundary to test
/// against: legislatures and the bodies elected to them.
pub static SUPPLEMENTAL_AREAS: &[(&str, &[AreaId])] = &[
    ("LAC", &[LAE_AREA_ID, LAS_AREA_ID]),
    ("SPC", &[SPA_AREA_ID]),
    ("WAC", &[WAS_AREA_ID]),
    ("NIE", &[NIA_AREA_ID]),
    ("WMC", &[WMP_AREA_ID]),
    ("EUR", &[EUP_AREA_ID]),
];

/// Supplemental ids implied by a list of areas, in order, without repeats.
pub fn supplemental_ids<'a>(areas: impl IntoIterator<Item = &'a Area>) -> Vec<AreaId> {
    let ids = areas.into_iter().flat_map(|area| {
        SUPPLEMENTAL_AREAS
            .iter()
            .filter(move |(type_code, _)| *type_code == area.type_code)
            .flat_map(|(_, ids)| ids.iter().copied())
    });
    dedup_keep_first(ids, |id| *id)
}

/// The two parts of a postcode's areas.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAreas {
    /// Found by containment or membership.
    pub direct: Vec<Area>,

    /// Added from [`SUPPLEMENTAL_AREAS`], none repeating a direct area.
    pub supplemental: Vec<Area>,
}

impl ResolvedAreas {
    pub fn iter(&self) -> impl Iterator<Item = &Area> {
        self.direct.iter().chain(&self.supplemental)
    }

    pub fn into_areas(self) -> Vec<Area> {
        let mut areas = self.direct;
        areas.extend(self.supplemental);
        areas
    }
}

impl PostcodeResolver {
    /// The areas of `postcode` in `generation`.
    ///
    /// Special postcodes (per the configured rules) have no areas.
    pub async fn resolve_areas(
        &self,
        postcode: &Postcode,
        generation: GenerationId,
    ) -> Result<Vec<Area>> {
        Ok(self
            .resolve_area_parts(postcode, generation)
            .await?
            .into_areas())
    }

    /// As [`resolve_areas`](Self::resolve_areas), keeping the direct and
    /// supplemental areas apart.
    pub async fn resolve_area_parts(
        &self,
        postcode: &Postcode,
        generation: GenerationId,
    ) -> Result<ResolvedAreas> {
        let span = tracing::debug_span!(
            "resolve_areas",
            postcode = %postcode.code,
            generation,
            direct = tracing::field::Empty,
            supplemental = tracing::field::Empty,
        );
        async {
            if self.rules().is_special(&postcode.code) {
                tracing::debug!("special postcode, no areas");
                return Ok(ResolvedAreas::default());
            }

            let mut direct = Vec::new();
            if let Some(location) = postcode.location {
                let containing = self
                    .bounded(self.store().areas_containing(location, generation))
                    .await
                    .into_result()?;
                direct.extend(containing.unwrap_or_default());
            }
            let members = self
                .bounded(self.store().areas_for_postcode(&postcode.code, generation))
                .await
                .into_result()?;
            direct.extend(members.unwrap_or_default());
            let direct = dedup_keep_first(direct, |area| area.id);

            let wanted: Vec<AreaId> = supplemental_ids(&direct)
                .into_iter()
                .filter(|id| !direct.iter().any(|area| area.id == *id))
                .collect();
            let supplemental = if wanted.is_empty() {
                Vec::new()
            } else {
                self.bounded(self.store().areas_by_id(&wanted, generation))
                    .await
                    .into_result()?
                    .unwrap_or_default()
            };

            let span = tracing::Span::current();
            span.record("direct", direct.len());
            span.record("supplemental", supplemental.len());
            Ok(ResolvedAreas {
                direct,
                supplemental,
            })
        }
        .instrument(span)
        .await
    }
}
