//! Postcode and point resolution.
//!
//! Resolves postcodes to the areas that contain them and points to their
//! nearest postcode, against a generation-versioned
//! [`postcode_spatial`] store.
//!
//! # Architecture
//!
//! - [`PostcodeResolver`]: the engine; every operation below is a method
//! - [`validate`]: full and partial postcode grammar
//! - [`generation`]: generation selection with fallback to current
//! - [`areas`]: containment, membership and supplemental areas
//! - [`shortcuts`]: role-keyed shortcut index
//! - [`nearest`]: two-phase nearest postcode search
//! - [`partial`]: partial postcode centroids
//! - [`example`]: example postcode for an area, with a containment fallback
//! - [`deadline`]: per-query deadlines and explicit query outcomes
//! - [`rules`]: injected country-specific postcode rules
//!
//! # Example
//!
//! ```ignore
//! use postcode_resolver::{GbRules, PostcodeResolver, ResolverConfig};
//! use postcode_spatial::EmbeddedSpatialProvider;
//!
//! let store = Arc::new(EmbeddedSpatialProvider::new(snapshot));
//! let resolver = PostcodeResolver::new(store, ResolverConfig::default()).with_rules(GbRules);
//!
//! let result = resolver.lookup_postcode("SW1A 1AA", None).await?;
//! let nearest = resolver.nearest(529090.0, 179645.0, 27700).await?;
//! ```

pub mod areas;
pub mod config;
pub mod deadline;
pub mod error;
mod example;
pub mod generation;
mod lookup;
pub mod nearest;
pub mod output;
pub mod partial;
mod resolver;
pub mod rules;
pub mod shortcuts;
pub mod validate;

pub use areas::{ResolvedAreas, SUPPLEMENTAL_AREAS};
pub use config::ResolverConfig;
pub use deadline::QueryOutcome;
pub use error::{ResolveError, Result};
pub use generation::{current_generation, select_generation};
pub use output::{AreaSummary, NearestResult, PostcodeResult, PostcodeSummary};
pub use resolver::PostcodeResolver;
pub use rules::{DefaultRules, GbRules, PostcodeRules};
pub use shortcuts::{build_shortcuts, AreaRole, Branch, ShortcutIndex, ShortcutKey};
pub use validate::{display_postcode, is_valid_full, is_valid_partial};
