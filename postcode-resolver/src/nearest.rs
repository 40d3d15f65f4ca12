//! Nearest postcode search.
//!
//! Two phases: the store returns the K postcodes nearest by centroid
//! distance (planar degrees, cheap to index), then those candidates are
//! re-ranked by ground distance. Degrees of longitude shrink with latitude,
//! so the centroid order can be wrong; it only has to put the true nearest
//! postcode somewhere in the top K.

use crate::error::{ResolveError, Result};
use crate::output::{NearestResult, PostcodeSummary};
use crate::resolver::PostcodeResolver;
use geo_types::Point;
use postcode_spatial::{ground_distance, NearestCandidate, Postcode, ReferenceSystem};
use std::time::Duration;
use tracing::Instrument;

/// Pick the candidate with the smallest ground distance to `point`.
///
/// Ties go to the earlier candidate. Candidates without a location are
/// ignored.
pub fn rank_by_ground_distance(
    point: &Point<f64>,
    candidates: Vec<NearestCandidate>,
) -> Option<(Postcode, f64)> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let location = candidate.postcode.location?;
            Some((candidate.postcode, ground_distance(point, &location)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

impl PostcodeResolver {
    /// The postcode nearest to `(x, y)` in reference system `srid`.
    pub async fn nearest(&self, x: f64, y: f64, srid: i32) -> Result<NearestResult> {
        let span = tracing::debug_span!(
            "nearest_postcode",
            x,
            y,
            srid,
            candidates = tracing::field::Empty,
            distance = tracing::field::Empty,
        );
        async {
            let system = ReferenceSystem::from_srid(srid)
                .map_err(|err| ResolveError::from_store(err, Duration::ZERO))?;
            let point = system
                .to_wgs84(x, y)
                .map_err(|_| ResolveError::PointOutsideGeometry { srid })?;

            let generation = self.current_generation().await?;
            let not_found =
                || ResolveError::not_found(format!("No postcode found near {x},{y} ({srid})"));

            let candidates = self
                .bounded(self.store().nearest_candidates(
                    point,
                    self.config().nearest_k(),
                    generation.id,
                ))
                .await
                .non_empty(Vec::is_empty)
                .or_not_found(not_found)?;
            tracing::Span::current().record("candidates", candidates.len());

            let (postcode, distance) =
                rank_by_ground_distance(&point, candidates).ok_or_else(not_found)?;
            let distance_meters = distance.round() as u64;
            tracing::Span::current().record("distance", distance_meters);

            Ok(NearestResult {
                summary: PostcodeSummary::of(&postcode),
                distance_meters,
                postcode,
            })
        }
        .instrument(span)
        .await
    }
}
