//! Records held by the spatial store.
//!
//! These are read-only from the query path's point of view: the store is
//! built once and every query hands out clones.

use crate::validity::{GenerationId, Validity, Versioned};
use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Area identifier.
pub type AreaId = u32;

/// A dataset snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub id: GenerationId,

    /// Only active generations may be queried.
    pub active: bool,

    pub description: String,
}

impl Generation {
    pub fn new(id: GenerationId, active: bool, description: impl Into<String>) -> Self {
        Self {
            id,
            active,
            description: description.into(),
        }
    }
}

/// A postcode and its location.
///
/// `code` is the normalized form: uppercase, no whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Postcode {
    pub code: String,

    /// WGS84 location (x = longitude, y = latitude). Some postcodes are known
    /// without a location and resolve only through area membership.
    pub location: Option<Point<f64>>,

    pub validity: Validity,
}

impl Postcode {
    pub fn new(code: impl Into<String>, location: Option<Point<f64>>, validity: Validity) -> Self {
        Self {
            code: code.into(),
            location,
            validity,
        }
    }
}

impl Versioned for Postcode {
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

impl Versioned for &Postcode {
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

/// An administrative or electoral area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,

    /// Area type code, e.g. "WMC", "LBW", "CED".
    #[serde(rename = "type")]
    pub type_code: String,

    /// Country code, e.g. "E", "S", "W", "N".
    pub country: Option<String>,

    pub parent_area_id: Option<AreaId>,

    #[serde(flatten)]
    pub validity: Validity,

    /// External identifiers keyed by code type (e.g. "gss", "ons").
    pub codes: BTreeMap<String, String>,
}

impl Area {
    pub fn new(
        id: AreaId,
        name: impl Into<String>,
        type_code: impl Into<String>,
        validity: Validity,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            type_code: type_code.into(),
            country: None,
            parent_area_id: None,
            validity,
            codes: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: AreaId) -> Self {
        self.parent_area_id = Some(parent);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_code(mut self, kind: impl Into<String>, code: impl Into<String>) -> Self {
        self.codes.insert(kind.into(), code.into());
        self
    }
}

impl Versioned for Area {
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

impl Versioned for &Area {
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

/// A nearest-postcode candidate ranked by centroid distance.
#[derive(Debug, Clone)]
pub struct NearestCandidate {
    pub postcode: Postcode,

    /// Planar distance in degrees between the query point and the postcode.
    /// Cheap to order by, but not a ground distance.
    pub centroid_distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_serializes_flat_validity() {
        let area = Area::new(7, "Vauxhall", "WMC", Validity::between(1, 3))
            .with_country("E")
            .with_code("gss", "E14001009");
        let json = serde_json::to_value(&area).unwrap();
        assert_eq!(json["type"], "WMC");
        assert_eq!(json["generation_start"], 1);
        assert_eq!(json["generation_end"], 3);
        assert_eq!(json["codes"]["gss"], "E14001009");
        assert_eq!(json["parent_area_id"], serde_json::Value::Null);
    }
}
