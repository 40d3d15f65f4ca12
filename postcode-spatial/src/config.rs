//! Spatial store configuration types.

use crate::error::{Result, SpatialError};
use serde::{Deserialize, Serialize};

/// Smallest accepted cell size. Finer grids overflow 64-bit cell ids.
pub const MIN_CELL_SIZE_DEGREES: f64 = 1e-6;

/// Configuration for building and querying a spatial store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Grid cell size (degrees) for the postcode point index.
    /// Default: 0.01 (roughly 1.1km of latitude)
    pub cell_size_degrees: f64,

    /// Grid cell size (degrees) for area bounding-box coverings.
    /// Default: 0.1
    pub area_cell_size_degrees: f64,

    /// Maximum number of grid cells in an area covering. Areas whose bounding
    /// box needs more cells are kept in an oversized list that every
    /// containment query checks.
    /// Default: 4096
    pub max_cells_per_area: usize,

    /// Number of queries that may hold a query slot at once.
    /// Default: 64
    pub max_concurrent_queries: usize,

    /// SRID the store keeps its coordinates in.
    /// Default: 4326 (WGS84 lon/lat)
    pub canonical_srid: i32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cell_size_degrees: 0.01,
            area_cell_size_degrees: 0.1,
            max_cells_per_area: 4096,
            max_concurrent_queries: 64,
            canonical_srid: 4326,
        }
    }
}

impl StoreConfig {
    /// Set the point index cell size.
    pub fn with_cell_size(mut self, degrees: f64) -> Self {
        self.cell_size_degrees = degrees;
        self
    }

    /// Set the area covering cell size.
    pub fn with_area_cell_size(mut self, degrees: f64) -> Self {
        self.area_cell_size_degrees = degrees;
        self
    }

    /// Set the maximum number of concurrent query slots.
    pub fn with_max_concurrent_queries(mut self, slots: usize) -> Self {
        self.max_concurrent_queries = slots;
        self
    }

    /// Check the configuration before building a store with it.
    pub fn validate(&self) -> Result<()> {
        for (name, size) in [
            ("cell_size_degrees", self.cell_size_degrees),
            ("area_cell_size_degrees", self.area_cell_size_degrees),
        ] {
            if !(size.is_finite() && (MIN_CELL_SIZE_DEGREES..=90.0).contains(&size)) {
                return Err(SpatialError::Config(format!(
                    "{name} must be in [{MIN_CELL_SIZE_DEGREES}, 90], got {size}"
                )));
            }
        }
        if self.max_concurrent_queries == 0 {
            return Err(SpatialError::Config(
                "max_concurrent_queries must be positive".into(),
            ));
        }
        if self.canonical_srid != 4326 {
            return Err(SpatialError::Config(format!(
                "unsupported canonical SRID {}",
                self.canonical_srid
            )));
        }
        Ok(())
    }
}
