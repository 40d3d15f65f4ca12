//! Output records.
//!
//! Shape-agnostic: these derive `Serialize` and an external renderer decides
//! what to do with them.

use crate::shortcuts::ShortcutIndex;
use crate::validate::display_postcode;
use postcode_spatial::{Area, AreaId, GenerationId, Postcode, ReferenceSystem};
use serde::Serialize;
use std::collections::BTreeMap;

/// Postcodes with this area prefix are on the Irish grid.
const IRISH_GRID_PREFIX: &str = "BT";

/// A postcode, its WGS84 location and national grid reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostcodeSummary {
    /// Display form, e.g. "SW1A 1AA".
    pub postcode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wgs84_lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wgs84_lon: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub easting: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub northing: Option<i64>,

    /// "G" for the British National Grid, "I" for the Irish Grid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordsyst: Option<&'static str>,
}

impl PostcodeSummary {
    /// Summarise a postcode.
    ///
    /// The grid reference is left out when the location is outside the
    /// grid's area of use.
    pub fn of(postcode: &Postcode) -> Self {
        let mut summary = Self {
            postcode: display_postcode(&postcode.code),
            wgs84_lat: None,
            wgs84_lon: None,
            easting: None,
            northing: None,
            coordsyst: None,
        };
        let Some(location) = &postcode.location else {
            return summary;
        };
        summary.wgs84_lat = Some(location.y());
        summary.wgs84_lon = Some(location.x());

        let (grid, coordsyst) = if postcode.code.starts_with(IRISH_GRID_PREFIX) {
            (ReferenceSystem::IrishGrid, "I")
        } else {
            (ReferenceSystem::BritishNationalGrid, "G")
        };
        if let Ok((easting, northing)) = grid.from_wgs84(location) {
            summary.easting = Some(easting.round() as i64);
            summary.northing = Some(northing.round() as i64);
            summary.coordsyst = Some(coordsyst);
        }
        summary
    }
}

/// An area as it appears in results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub id: AreaId,
    pub name: String,

    #[serde(rename = "type")]
    pub type_code: String,

    pub country: Option<String>,
    pub parent_area: Option<AreaId>,

    /// First generation the area is present in.
    pub generation_low: GenerationId,

    /// Last generation the area is present in; `None` while still live.
    pub generation_high: Option<GenerationId>,

    pub codes: BTreeMap<String, String>,
}

impl AreaSummary {
    pub fn of(area: &Area) -> Self {
        Self {
            id: area.id,
            name: area.name.clone(),
            type_code: area.type_code.clone(),
            country: area.country.clone(),
            parent_area: area.parent_area_id,
            generation_low: area.validity.start,
            generation_high: area.validity.end.map(|end| end.saturating_sub(1)),
            codes: area.codes.clone(),
        }
    }
}

/// Result of a full postcode lookup.
#[derive(Debug, Clone, Serialize)]
pub struct PostcodeResult {
    #[serde(flatten)]
    pub postcode: PostcodeSummary,

    pub areas: BTreeMap<AreaId, AreaSummary>,

    /// Area ids in resolution order.
    #[serde(skip)]
    pub area_order: Vec<AreaId>,

    #[serde(skip_serializing_if = "ShortcutIndex::is_empty")]
    pub shortcuts: ShortcutIndex,
}

impl PostcodeResult {
    pub(crate) fn new(postcode: &Postcode, areas: &[Area], shortcuts: ShortcutIndex) -> Self {
        Self {
            postcode: PostcodeSummary::of(postcode),
            areas: areas.iter().map(|a| (a.id, AreaSummary::of(a))).collect(),
            area_order: areas.iter().map(|a| a.id).collect(),
            shortcuts,
        }
    }
}

/// Result of a nearest-postcode search.
#[derive(Debug, Clone, Serialize)]
pub struct NearestResult {
    #[serde(flatten)]
    pub summary: PostcodeSummary,

    /// Ground distance to the query point, in whole meters.
    #[serde(rename = "distance")]
    pub distance_meters: u64,

    #[serde(skip)]
    pub postcode: Postcode,
}
