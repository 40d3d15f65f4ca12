//! Queryable spatial store snapshot.
//!
//! Holds every generation's areas and postcodes at once; each query names
//! the generation it runs against and sees only records visible in it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       SpatialSnapshot                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │ area_index + arena │ point_index + codes │ memberships       │
//! └──────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    │
//!   cell scan / ring scan   prefix range scan        │
//!          │                    │                    │
//!          └──────────┬─────────┴────────────────────┘
//!                     ▼
//!            GenerationFilter (validity)
//!                     │
//!                     ▼
//!            bbox prefilter + exact test (geo crate)
//! ```

use crate::cell_index::CellIndex;
use crate::config::StoreConfig;
use crate::dedup::dedup_keep_first;
use crate::geometry::GeometryArena;
use crate::model::{Area, AreaId, Generation, NearestCandidate, Postcode};
use crate::validity::{GenerationFilter, GenerationId, Versioned};
use geo_types::Point;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Ring-scan cell visits always allowed before falling back to a linear pass.
const MIN_RING_VISITS: usize = 1024;

/// An area and the handle of its boundary in the arena.
///
/// Areas without a drawable boundary have no handle and are reachable only
/// by id or through the membership relation.
#[derive(Debug, Clone)]
pub(crate) struct AreaSlot {
    pub(crate) area: Area,
    pub(crate) geo_handle: Option<u32>,
}

/// A queryable spatial store snapshot.
pub struct SpatialSnapshot {
    pub(crate) config: StoreConfig,

    /// Sorted by id.
    pub(crate) generations: Vec<Generation>,

    pub(crate) areas: Vec<AreaSlot>,
    pub(crate) area_slots: FxHashMap<AreaId, u32>,
    pub(crate) arena: GeometryArena,

    /// Area bounding-box coverings on the coarse grid.
    pub(crate) area_index: CellIndex,

    /// Areas too large to cover; checked by every containment query.
    pub(crate) oversized_areas: Vec<u32>,

    pub(crate) postcodes: Vec<Postcode>,

    /// Normalized code -> postcode slot.
    pub(crate) codes: BTreeMap<String, u32>,

    /// Postcode locations on the fine grid.
    pub(crate) point_index: CellIndex,

    pub(crate) postcode_areas: FxHashMap<u32, Vec<AreaId>>,
    pub(crate) area_postcodes: FxHashMap<AreaId, Vec<u32>>,
}

impl SpatialSnapshot {
    /// Configuration the snapshot was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// All generations, oldest first.
    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }

    /// Get a generation by id.
    pub fn generation(&self, id: GenerationId) -> Option<&Generation> {
        self.generations
            .binary_search_by_key(&id, |g| g.id)
            .ok()
            .map(|i| &self.generations[i])
    }

    /// The highest active generation.
    pub fn current_generation(&self) -> Option<&Generation> {
        self.generations.iter().rev().find(|g| g.active)
    }

    /// Number of postcodes across all generations.
    pub fn postcode_count(&self) -> usize {
        self.postcodes.len()
    }

    /// Number of areas across all generations.
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// Get a postcode by normalized code, whatever its validity.
    pub fn postcode(&self, code: &str) -> Option<&Postcode> {
        self.codes
            .get(code)
            .map(|&slot| &self.postcodes[slot as usize])
    }

    /// Get an area by id, whatever its validity.
    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.area_slots
            .get(&id)
            .map(|&slot| &self.areas[slot as usize].area)
    }

    /// Areas whose boundary contains `point` and that exist in `generation`.
    ///
    /// Results are in build order, each area once.
    pub fn areas_containing(&self, point: &Point<f64>, generation: GenerationId) -> Vec<Area> {
        let cell = self.area_index.grid().cell_at(point.x(), point.y());

        let mut slots: Vec<u32> = self
            .area_index
            .scan_cell(cell)
            .iter()
            .map(|e| e.subject)
            .chain(self.oversized_areas.iter().copied())
            .collect();
        slots.sort_unstable();
        slots.dedup();

        slots
            .iter()
            .map(|&slot| &self.areas[slot as usize])
            .filter(|s| s.area.visible_at(generation))
            .filter(|s| {
                s.geo_handle
                    .and_then(|h| self.arena.get(h))
                    .is_some_and(|entry| entry.contains_point(point))
            })
            .map(|s| s.area.clone())
            .collect()
    }

    /// Areas linked to a postcode through the membership relation.
    pub fn areas_for_postcode(&self, code: &str, generation: GenerationId) -> Vec<Area> {
        let Some(slot) = self.codes.get(code) else {
            return Vec::new();
        };
        let ids = self
            .postcode_areas
            .get(slot)
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.areas_by_id(ids, generation)
    }

    /// Areas by id, in the order given, skipping ids that are unknown or not
    /// present in `generation`.
    pub fn areas_by_id(&self, ids: &[AreaId], generation: GenerationId) -> Vec<Area> {
        let found = ids.iter().filter_map(|id| self.area(*id));
        dedup_keep_first(
            GenerationFilter::new(found, generation).cloned(),
            |area| area.id,
        )
    }

    /// The `k` postcodes nearest to `point` by centroid distance.
    ///
    /// Rings of grid cells are scanned outwards from the point's cell. A
    /// point outside rings `0..=r` is at least `r` cells away, so scanning
    /// stops once the k-th best centroid distance is within that bound.
    /// When the rings would take more cell visits than there are index
    /// entries (sparse data, a far-away point, fewer than `k` postcodes), a
    /// linear pass over every postcode is cheaper and gives the same answer.
    /// Results are sorted by centroid distance, ties by build order.
    pub fn nearest_candidates(
        &self,
        point: &Point<f64>,
        k: usize,
        generation: GenerationId,
    ) -> Vec<NearestCandidate> {
        let Some(extent) = self.point_index.extent() else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let grid = self.point_index.grid();
        let center = grid.cell_at(point.x(), point.y());
        let first_ring = extent.ring_distance_to(center);
        let last_ring = extent.ring_span_from(center);
        let budget = self.point_index.len().max(MIN_RING_VISITS);

        let mut visits = 0usize;
        let mut found: Vec<(f64, u32)> = Vec::new();
        for ring in first_ring..=last_ring {
            // Top and bottom runs plus two side cells per row
            visits = visits.saturating_add(2 * ring as usize + 1);
            if visits > budget {
                tracing::trace!(ring, visits, "ring scan over budget, scanning linearly");
                return self.nearest_by_scan(point, k, generation);
            }

            for slice in self.point_index.scan_ring(center, ring) {
                for entry in slice {
                    let postcode = &self.postcodes[entry.subject as usize];
                    if !postcode.visible_at(generation) {
                        continue;
                    }
                    if let Some(location) = &postcode.location {
                        found.push((centroid_distance(point, location), entry.subject));
                    }
                }
            }

            if found.len() >= k {
                let (_, kth, _) = found.select_nth_unstable_by(k - 1, cmp_candidate);
                if kth.0 <= ring as f64 * grid.cell_size() {
                    break;
                }
            }
        }

        self.closest(found, k)
    }

    /// [`nearest_candidates`](Self::nearest_candidates) without the index.
    pub(crate) fn nearest_by_scan(
        &self,
        point: &Point<f64>,
        k: usize,
        generation: GenerationId,
    ) -> Vec<NearestCandidate> {
        let found = self
            .postcodes
            .iter()
            .enumerate()
            .filter(|(_, postcode)| postcode.visible_at(generation))
            .filter_map(|(slot, postcode)| {
                let location = postcode.location.as_ref()?;
                Some((centroid_distance(point, location), slot as u32))
            })
            .collect();
        self.closest(found, k)
    }

    fn closest(&self, mut found: Vec<(f64, u32)>, k: usize) -> Vec<NearestCandidate> {
        found.sort_by(cmp_candidate);
        found.truncate(k);
        found
            .into_iter()
            .map(|(centroid_distance, slot)| NearestCandidate {
                postcode: self.postcodes[slot as usize].clone(),
                centroid_distance,
            })
            .collect()
    }

    /// Locations of postcodes starting with `prefix` whose code is exactly
    /// `code_len` characters, present in `generation`.
    pub fn postcode_locations(
        &self,
        prefix: &str,
        code_len: usize,
        generation: GenerationId,
    ) -> Vec<Point<f64>> {
        let matching = self
            .codes
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(code, _)| code.starts_with(prefix))
            .filter(|(code, _)| code.len() == code_len)
            .map(|(_, &slot)| &self.postcodes[slot as usize]);

        GenerationFilter::new(matching, generation)
            .filter_map(|postcode| postcode.location)
            .collect()
    }

    /// First postcode linked to `area_id` through the membership relation.
    pub fn member_postcode(&self, area_id: AreaId, generation: GenerationId) -> Option<Postcode> {
        let slots = self.area_postcodes.get(&area_id)?;
        let members = slots.iter().map(|&slot| &self.postcodes[slot as usize]);
        GenerationFilter::new(members, generation).next().cloned()
    }

    /// Postcodes whose location lies inside the boundary of `area_id`.
    ///
    /// Scans the point grid under the area's bounding box and stops after
    /// `limit` hits.
    pub fn postcodes_within_area(
        &self,
        area_id: AreaId,
        generation: GenerationId,
        limit: usize,
    ) -> Vec<Postcode> {
        let Some(entry) = self
            .area_slots
            .get(&area_id)
            .and_then(|&slot| self.areas[slot as usize].geo_handle)
            .and_then(|handle| self.arena.get(handle))
        else {
            return Vec::new();
        };

        let mut results = Vec::new();
        if limit == 0 {
            return results;
        }
        for (min_cell, max_cell) in self.point_index.grid().covering(&entry.bbox) {
            for cell_entry in self.point_index.scan_range(min_cell, max_cell) {
                let postcode = &self.postcodes[cell_entry.subject as usize];
                if !postcode.visible_at(generation) {
                    continue;
                }
                if postcode
                    .location
                    .as_ref()
                    .is_some_and(|loc| entry.contains_point(loc))
                {
                    results.push(postcode.clone());
                    if results.len() >= limit {
                        return results;
                    }
                }
            }
        }
        results
    }
}

fn cmp_candidate(a: &(f64, u32), b: &(f64, u32)) -> std::cmp::Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Planar distance between two lon/lat points, in degrees.
///
/// Index-friendly ordering proxy only: a degree of longitude shrinks with
/// latitude, so this is not proportional to ground distance.
pub fn centroid_distance(a: &Point<f64>, b: &Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

/// Haversine distance between two points in meters.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Ground distance in meters between two lon/lat points.
pub fn ground_distance(a: &Point<f64>, b: &Point<f64>) -> f64 {
    haversine_distance(a.y(), a.x(), b.y(), b.x())
}
