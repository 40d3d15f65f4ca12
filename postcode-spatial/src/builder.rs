//! Spatial store builder.
//!
//! Accumulates generations, areas, postcodes and membership links, then
//! produces an immutable [`SpatialSnapshot`]. The builder:
//! 1. Parses each area boundary once into the geometry arena
//! 2. Covers area bounding boxes on the coarse grid, or marks them oversized
//! 3. Places postcode locations on the fine grid
//! 4. Sorts both cell indexes for range scans
//!
//! # Usage
//!
//! ```ignore
//! let mut builder = SpatialSnapshotBuilder::new(StoreConfig::default());
//! builder.add_generation(Generation::new(1, true, "May 2024"))?;
//! builder.add_area(area, Some("POLYGON((...))"))?;
//! builder.add_postcode(Postcode::new("SW1A1AA", Some(point), Validity::since(1)))?;
//! builder.link_postcode("SW1A1AA", area_id)?;
//! let snapshot = builder.build()?;
//! ```

use crate::cell_index::{CellEntry, CellGrid, CellIndexBuilder};
use crate::config::StoreConfig;
use crate::error::{Result, SpatialError};
use crate::geometry::GeometryArena;
use crate::model::{Area, AreaId, Generation, Postcode};
use crate::snapshot::{AreaSlot, SpatialSnapshot};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Statistics collected while building.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of areas added.
    pub areas_added: u64,

    /// Number of areas added without a boundary.
    pub areas_without_boundary: u64,

    /// Areas whose covering exceeded `max_cells_per_area`.
    pub oversized_areas: u64,

    /// Total area cell entries generated.
    pub area_cell_entries: u64,

    /// Number of postcodes added.
    pub postcodes_added: u64,

    /// Postcodes known without a location.
    pub postcodes_without_location: u64,

    /// Postcode/area membership links.
    pub memberships: u64,
}

/// Builder for spatial snapshots.
pub struct SpatialSnapshotBuilder {
    config: StoreConfig,
    generations: Vec<Generation>,
    areas: Vec<AreaSlot>,
    area_slots: FxHashMap<AreaId, u32>,
    arena: GeometryArena,
    postcodes: Vec<Postcode>,
    codes: BTreeMap<String, u32>,
    postcode_areas: FxHashMap<u32, Vec<AreaId>>,
    area_postcodes: FxHashMap<AreaId, Vec<u32>>,
    stats: BuildStats,
}

impl SpatialSnapshotBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            generations: Vec::new(),
            areas: Vec::new(),
            area_slots: FxHashMap::default(),
            arena: GeometryArena::new(),
            postcodes: Vec::new(),
            codes: BTreeMap::new(),
            postcode_areas: FxHashMap::default(),
            area_postcodes: FxHashMap::default(),
            stats: BuildStats::default(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get current build statistics.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Register a generation. Ids must be unique.
    pub fn add_generation(&mut self, generation: Generation) -> Result<()> {
        if self.generations.iter().any(|g| g.id == generation.id) {
            return Err(SpatialError::Config(format!(
                "duplicate generation {}",
                generation.id
            )));
        }
        self.generations.push(generation);
        Ok(())
    }

    /// Add an area and, if it has one, its boundary as WKT in lon/lat.
    ///
    /// Boundaries that fail to parse are rejected rather than skipped: an
    /// area silently missing from containment results is worse than a
    /// failed build.
    pub fn add_area(&mut self, area: Area, boundary_wkt: Option<&str>) -> Result<()> {
        if self.area_slots.contains_key(&area.id) {
            return Err(SpatialError::Config(format!("duplicate area {}", area.id)));
        }
        if area.validity.is_empty() {
            return Err(SpatialError::Config(format!(
                "area {} has an empty generation range",
                area.id
            )));
        }

        let geo_handle = match boundary_wkt {
            Some(wkt) => Some(self.arena.add(wkt).inspect_err(|e| {
                tracing::debug!(area_id = area.id, error = %e, "Rejected area boundary");
            })?),
            None => {
                self.stats.areas_without_boundary += 1;
                None
            }
        };

        let slot = next_slot(self.areas.len())?;
        self.area_slots.insert(area.id, slot);
        self.areas.push(AreaSlot { area, geo_handle });
        self.stats.areas_added += 1;
        Ok(())
    }

    /// Add a postcode. The code is normalized (uppercase, no whitespace)
    /// and must be unique.
    pub fn add_postcode(&mut self, mut postcode: Postcode) -> Result<()> {
        postcode.code = normalize_code(&postcode.code);
        if self.codes.contains_key(&postcode.code) {
            return Err(SpatialError::Config(format!(
                "duplicate postcode {}",
                postcode.code
            )));
        }
        if postcode.validity.is_empty() {
            return Err(SpatialError::Config(format!(
                "postcode {} has an empty generation range",
                postcode.code
            )));
        }
        if let Some(location) = &postcode.location {
            if !(location.x().is_finite() && location.y().is_finite()) {
                return Err(SpatialError::InvalidGeometry(format!(
                    "postcode {} has a non-finite location",
                    postcode.code
                )));
            }
        } else {
            self.stats.postcodes_without_location += 1;
        }

        let slot = next_slot(self.postcodes.len())?;
        self.codes.insert(postcode.code.clone(), slot);
        self.postcodes.push(postcode);
        self.stats.postcodes_added += 1;
        Ok(())
    }

    /// Record that a postcode belongs to an area, independently of geometry.
    ///
    /// Both must already have been added. Repeated links are ignored.
    pub fn link_postcode(&mut self, code: &str, area_id: AreaId) -> Result<()> {
        let code = normalize_code(code);
        let slot = *self
            .codes
            .get(&code)
            .ok_or_else(|| SpatialError::Config(format!("unknown postcode {code}")))?;
        if !self.area_slots.contains_key(&area_id) {
            return Err(SpatialError::Config(format!("unknown area {area_id}")));
        }

        let areas = self.postcode_areas.entry(slot).or_default();
        if areas.contains(&area_id) {
            return Ok(());
        }
        areas.push(area_id);
        self.area_postcodes.entry(area_id).or_default().push(slot);
        self.stats.memberships += 1;
        Ok(())
    }

    /// Freeze into a queryable snapshot.
    pub fn build(mut self) -> Result<SpatialSnapshot> {
        self.config.validate()?;
        self.generations.sort_by_key(|g| g.id);

        let area_grid = CellGrid::new(self.config.area_cell_size_degrees);
        let mut area_cells = CellIndexBuilder::new();
        let mut oversized_areas = Vec::new();
        for (slot, area_slot) in self.areas.iter().enumerate() {
            let Some(entry) = area_slot.geo_handle.and_then(|h| self.arena.get(h)) else {
                continue;
            };
            let slot = slot as u32;
            let bbox = &entry.bbox;
            if area_grid.covering_size(bbox) > self.config.max_cells_per_area as u64 {
                oversized_areas.push(slot);
                self.stats.oversized_areas += 1;
                continue;
            }
            let ranges = area_grid.covering(bbox);
            self.stats.area_cell_entries += area_grid.covering_size(bbox);
            area_cells.push_ranges(&ranges, slot);
        }

        let point_grid = CellGrid::new(self.config.cell_size_degrees);
        let mut point_cells = CellIndexBuilder::new();
        for (slot, postcode) in self.postcodes.iter().enumerate() {
            if let Some(location) = &postcode.location {
                let cell = point_grid.cell_at(location.x(), location.y());
                point_cells.push(CellEntry::new(point_grid.cell_id(cell), slot as u32));
            }
        }

        tracing::debug!(
            generations = self.generations.len(),
            areas = self.stats.areas_added,
            boundaries = self.arena.len(),
            oversized = self.stats.oversized_areas,
            postcodes = self.stats.postcodes_added,
            memberships = self.stats.memberships,
            "Built spatial snapshot"
        );

        Ok(SpatialSnapshot {
            config: self.config,
            generations: self.generations,
            areas: self.areas,
            area_slots: self.area_slots,
            arena: self.arena,
            area_index: area_cells.build(area_grid),
            oversized_areas,
            postcodes: self.postcodes,
            codes: self.codes,
            point_index: point_cells.build(point_grid),
            postcode_areas: self.postcode_areas,
            area_postcodes: self.area_postcodes,
        })
    }
}

fn next_slot(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| SpatialError::Internal("store is full".into()))
}

fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validity::Validity;
    use geo_types::Point;

    const SQUARE: &str = "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))";

    #[test]
    fn test_builder_stats() {
        let mut b = SpatialSnapshotBuilder::new(StoreConfig::default());
        b.add_generation(Generation::new(1, true, "g1")).unwrap();
        b.add_area(Area::new(1, "A", "CTY", Validity::since(1)), Some(SQUARE))
            .unwrap();
        b.add_area(Area::new(2, "B", "CTY", Validity::since(1)), Some(SQUARE))
            .unwrap();
        b.add_area(Area::new(3, "C", "WMP", Validity::since(1)), None)
            .unwrap();
        b.add_postcode(Postcode::new("ab1 2cd", Some(Point::new(0.5, 0.5)), Validity::since(1)))
            .unwrap();
        b.link_postcode("AB12CD", 3).unwrap();
        b.link_postcode("AB1 2CD", 3).unwrap();

        let stats = b.stats().clone();
        assert_eq!(stats.areas_added, 3);
        assert_eq!(stats.areas_without_boundary, 1);
        assert_eq!(stats.postcodes_added, 1);
        assert_eq!(stats.memberships, 1);

        let snap = b.build().unwrap();
        // Identical boundaries share one arena entry
        assert_eq!(snap.arena.len(), 1);
        assert_eq!(snap.area_count(), 3);
        assert!(snap.postcode("AB12CD").is_some());
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut b = SpatialSnapshotBuilder::new(StoreConfig::default());
        b.add_generation(Generation::new(1, true, "g1")).unwrap();
        assert!(b.add_generation(Generation::new(1, false, "again")).is_err());

        b.add_area(Area::new(1, "A", "CTY", Validity::since(1)), None)
            .unwrap();
        assert!(b
            .add_area(Area::new(1, "A", "CTY", Validity::since(1)), None)
            .is_err());

        b.add_postcode(Postcode::new("AB12CD", None, Validity::since(1)))
            .unwrap();
        assert!(b
            .add_postcode(Postcode::new("ab12cd", None, Validity::since(1)))
            .is_err());
    }

    #[test]
    fn test_bad_input_rejected() {
        let mut b = SpatialSnapshotBuilder::new(StoreConfig::default());
        let err = b
            .add_area(Area::new(1, "A", "CTY", Validity::since(1)), Some("POLYGON(("))
            .unwrap_err();
        assert!(matches!(err, SpatialError::WktParse(_)));

        assert!(b
            .add_area(Area::new(2, "B", "CTY", Validity::between(3, 3)), None)
            .is_err());
        assert!(b.link_postcode("ZZ11ZZ", 1).is_err());
        assert!(b
            .add_postcode(Postcode::new(
                "AB12CD",
                Some(Point::new(f64::NAN, 0.0)),
                Validity::since(1)
            ))
            .is_err());
    }

    #[test]
    fn test_oversized_areas() {
        let config = StoreConfig {
            max_cells_per_area: 4,
            ..StoreConfig::default()
        };
        let mut b = SpatialSnapshotBuilder::new(config);
        b.add_area(
            Area::new(1, "Small", "CTY", Validity::since(1)),
            Some("POLYGON((0.01 0.01, 0.05 0.01, 0.05 0.05, 0.01 0.01))"),
        )
        .unwrap();
        b.add_area(Area::new(2, "Large", "EUR", Validity::since(1)), Some(SQUARE))
            .unwrap();
        let snap = b.build().unwrap();
        assert_eq!(snap.oversized_areas, vec![1]);
        assert_eq!(snap.area_index.len(), 1);
    }

    #[test]
    fn test_invalid_config_fails_build() {
        for size in [0.0, 1e-9] {
            let config = StoreConfig::default().with_cell_size(size);
            assert!(SpatialSnapshotBuilder::new(config).build().is_err());
        }
    }
}
