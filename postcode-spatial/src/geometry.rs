//! Area boundaries.
//!
//! Boundaries arrive as WKT and are parsed once, when the store is built, into
//! `geo_types` geometries held in a [`GeometryArena`]. Containment checks at
//! query time never reparse. The arena deduplicates by WKT hash, so an area
//! re-issued unchanged in a later generation shares its predecessor's
//! geometry.

use crate::error::{Result, SpatialError};
use geo::{BoundingRect, Contains};
use geo_types::{Geometry, Point};
use std::hash::{Hash, Hasher};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Inclusive on every edge.
    pub fn contains_point(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// Bounds of a boundary.
    ///
    /// Fails for empty geometries and anything that cannot hold a point in
    /// its interior: a boundary is only ever used for containment.
    pub fn of_boundary(geom: &Geometry<f64>) -> Result<Self> {
        if !is_polygonal(geom) {
            return Err(SpatialError::InvalidGeometry(
                "area boundary must be polygonal".into(),
            ));
        }
        let rect = geom
            .bounding_rect()
            .ok_or_else(|| SpatialError::InvalidGeometry("empty geometry".into()))?;
        let bbox = Self::new(rect.min().y, rect.max().y, rect.min().x, rect.max().x);
        if ![bbox.min_lat, bbox.max_lat, bbox.min_lng, bbox.max_lng]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(SpatialError::InvalidGeometry(
                "non-finite coordinates".into(),
            ));
        }
        Ok(bbox)
    }
}

fn is_polygonal(geom: &Geometry<f64>) -> bool {
    match geom {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) => true,
        Geometry::GeometryCollection(parts) => parts.iter().any(is_polygonal),
        _ => false,
    }
}

/// Entry in the geometry arena.
#[derive(Debug, Clone)]
pub struct ArenaEntry {
    pub geometry: Geometry<f64>,

    pub bbox: BBox,

    /// Original WKT, kept to verify hash hits.
    wkt: Box<str>,
}

impl ArenaEntry {
    /// Exact point-in-polygon test, bbox first.
    ///
    /// Points on the boundary are not contained.
    pub fn contains_point(&self, point: &Point<f64>) -> bool {
        self.bbox.contains_point(point.y(), point.x()) && self.geometry.contains(point)
    }
}

/// Geometry arena: every distinct area boundary, parsed once.
///
/// Append-only while the store is built and immutable afterwards.
#[derive(Default)]
pub struct GeometryArena {
    /// All entries in handle order.
    entries: Vec<ArenaEntry>,

    /// WKT hash -> handle for deduplication.
    wkt_index: rustc_hash::FxHashMap<u64, u32>,
}

impl GeometryArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a boundary to the arena, returning its handle.
    ///
    /// Deduplicates by WKT hash; if the same WKT already exists, returns
    /// the existing handle.
    pub fn add(&mut self, wkt: &str) -> Result<u32> {
        let mut hasher = rustc_hash::FxHasher::default();
        wkt.hash(&mut hasher);
        let hash = hasher.finish();

        if let Some(&handle) = self.wkt_index.get(&hash) {
            // Hash collision check
            if self.get(handle).is_some_and(|entry| &*entry.wkt == wkt) {
                return Ok(handle);
            }
        }

        let geometry = parse_wkt(wkt)?;
        let bbox = BBox::of_boundary(&geometry)?;

        let handle = u32::try_from(self.entries.len())
            .map_err(|_| SpatialError::Internal("geometry arena is full".into()))?;
        self.entries.push(ArenaEntry {
            geometry,
            bbox,
            wkt: wkt.into(),
        });
        self.wkt_index.insert(hash, handle);

        Ok(handle)
    }

    /// Get an entry by handle.
    pub fn get(&self, handle: u32) -> Option<&ArenaEntry> {
        self.entries.get(handle as usize)
    }

    /// Number of entries in the arena.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse WKT into a geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    let parsed: wkt::Wkt<f64> = text
        .parse()
        .map_err(|e| SpatialError::WktParse(format!("{e:?}")))?;
    parsed
        .try_into()
        .map_err(|e: wkt::conversion::Error| SpatialError::WktParse(format!("{e:?}")))
}
