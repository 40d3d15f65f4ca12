//! Partial postcode aggregation.

use crate::error::{ResolveError, Result};
use crate::resolver::PostcodeResolver;
use crate::validate::validate_partial;
use geo::Centroid;
use geo_types::{MultiPoint, Point};
use postcode_spatial::{Postcode, Validity};
use tracing::Instrument;

/// Length of an inward code.
const INWARD_LEN: usize = 3;

/// Arithmetic centroid of a set of points.
pub fn centroid_of(points: Vec<Point<f64>>) -> Option<Point<f64>> {
    MultiPoint::from(points).centroid()
}

impl PostcodeResolver {
    /// A synthetic postcode for a partial postcode, located at the centroid
    /// of the full postcodes it prefixes.
    ///
    /// A full postcode is accepted and reduced to its outward code. Only
    /// postcodes exactly one inward code longer than the prefix count, so
    /// `"SW1"` does not pick up `"SW1A1AA"`.
    pub async fn partial_postcode(&self, raw: &str) -> Result<Postcode> {
        let span = tracing::debug_span!(
            "partial_postcode",
            prefix = tracing::field::Empty,
            members = tracing::field::Empty,
        );
        async {
            let prefix = validate_partial(raw)?;
            tracing::Span::current().record("prefix", prefix.as_str());

            let generation = self.current_generation().await?;
            let not_found = || ResolveError::not_found("Postcode not found");
            let locations = self
                .bounded(self.store().postcode_locations(
                    &prefix,
                    prefix.len() + INWARD_LEN,
                    generation.id,
                ))
                .await
                .non_empty(Vec::is_empty)
                .or_not_found(not_found)?;
            tracing::Span::current().record("members", locations.len());

            let centroid = centroid_of(locations).ok_or_else(not_found)?;
            Ok(Postcode::new(
                prefix,
                Some(centroid),
                Validity::since(generation.id),
            ))
        }
        .instrument(span)
        .await
    }
}
