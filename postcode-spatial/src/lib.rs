//! Generation-versioned spatial store for postcodes and areas.
//!
//! This crate holds postcode points and area polygons for every dataset
//! generation at once and answers the geometric questions a postcode
//! resolver asks of them:
//!
//! - **Containment**: which areas contain a point
//! - **Membership**: which areas a postcode is linked to without geometry
//! - **Nearest candidates**: the K postcodes with the smallest centroid distance
//! - **Prefix scans**: postcode locations sharing an outward code
//! - **Reprojection** between the supported reference systems
//!
//! # Architecture
//!
//! Areas are covered on a coarse lon/lat grid, postcodes placed on a fine
//! one; both grids are sorted cell indexes scanned with binary search.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          SpatialSnapshot                            │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │ area grid + arena │ point grid │ code map │ membership relation     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                    │                      │                    │
//!                    └──────────┬───────────┘                    │
//!                               ▼                                │
//!                    GenerationFilter (validity)                 │
//!                               │                                │
//!                               ▼                                │
//!                    Deduper (by id)                             │
//!                               │                                │
//!                               ▼                                │
//!                    BBox prefilter ◄────────────────────────────┘
//!                               │
//!                               ▼
//!                    Exact containment (geo crate)
//! ```
//!
//! # Modules
//!
//! - [`config`]: Store configuration types
//! - [`builder`]: Snapshot builder
//! - [`geometry`]: WKT parsing, bounding boxes and the boundary arena
//! - [`cell_index`]: Sorted grid cell indexes
//! - [`projection`]: Reference systems and reprojection to and from WGS84
//! - [`validity`]: Generation ranges and generation filtering
//! - [`dedup`]: Order-preserving deduplication
//! - [`snapshot`]: The queryable store
//! - [`provider`]: Provider trait and the embedded implementation
//! - [`error`]: Error types

pub mod config;
pub mod error;

mod builder;
pub mod cell_index;
pub mod dedup;
pub mod geometry;
pub mod model;
pub mod projection;
mod provider;
mod snapshot;
pub mod validity;

// Re-export key types
pub use builder::{BuildStats, SpatialSnapshotBuilder};
pub use config::StoreConfig;
pub use dedup::dedup_keep_first;
pub use error::{Result, SpatialError};
pub use geometry::{BBox, GeometryArena};
pub use model::{Area, AreaId, Generation, NearestCandidate, Postcode};
pub use projection::ReferenceSystem;
pub use provider::{EmbeddedSpatialProvider, SpatialProvider};
pub use snapshot::{centroid_distance, ground_distance, haversine_distance, SpatialSnapshot};
pub use validity::{GenerationFilter, GenerationId, Validity, Versioned};
