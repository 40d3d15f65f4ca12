//! Shortcut index: role keys mapped to the area ids of a resolution result.
//!
//! Area type codes are classified into a closed set of [`AreaRole`]s by one
//! static table; each role writes fixed keys. The index is request-scoped
//! and derived purely from its input areas.
//!
//! | role           | keys written                          |
//! |----------------|---------------------------------------|
//! | `Ward`         | `ward` = id, `council` = parent       |
//! | `CountyWard`   | `ward.county`, `council.county`       |
//! | `DistrictWard` | `ward.district`, `council.district`   |
//! | `Literal`      | the type code itself = id             |

use postcode_spatial::{Area, AreaId};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// What an area type means for the shortcut index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaRole {
    /// Single-tier or unitary ward.
    Ward,
    /// County electoral division.
    CountyWard,
    /// District ward.
    DistrictWard,
    /// Indexed under its own type code.
    Literal,
}

/// Type code to role. Unlisted codes contribute nothing.
pub static AREA_ROLES: &[(&str, AreaRole)] = &[
    ("COP", AreaRole::Ward),
    ("LBW", AreaRole::Ward),
    ("LGE", AreaRole::Ward),
    ("MTW", AreaRole::Ward),
    ("UTE", AreaRole::Ward),
    ("UTW", AreaRole::Ward),
    ("CED", AreaRole::CountyWard),
    ("DIW", AreaRole::DistrictWard),
    ("WMC", AreaRole::Literal),
];

impl AreaRole {
    /// Look up the role of a type code.
    pub fn classify(type_code: &str) -> Option<Self> {
        AREA_ROLES
            .iter()
            .find(|(code, _)| *code == type_code)
            .map(|(_, role)| *role)
    }
}

/// Second-level branch of a two-tier council hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Branch {
    County,
    District,
}

/// A shortcut index key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShortcutKey {
    Ward,
    Council,
    WardBranch(Branch),
    CouncilBranch(Branch),
    TypeCode(String),
}

impl fmt::Display for ShortcutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let branch = |b: &Branch| match b {
            Branch::County => "county",
            Branch::District => "district",
        };
        match self {
            ShortcutKey::Ward => f.write_str("ward"),
            ShortcutKey::Council => f.write_str("council"),
            ShortcutKey::WardBranch(b) => write!(f, "ward.{}", branch(b)),
            ShortcutKey::CouncilBranch(b) => write!(f, "council.{}", branch(b)),
            ShortcutKey::TypeCode(code) => f.write_str(code),
        }
    }
}

/// Shortcut index.
///
/// Council keys hold the ward's parent, which may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutIndex {
    entries: BTreeMap<ShortcutKey, Option<AreaId>>,
}

impl ShortcutIndex {
    pub fn get(&self, key: &ShortcutKey) -> Option<Option<AreaId>> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ShortcutKey, &Option<AreaId>)> {
        self.entries.iter()
    }

    fn set(&mut self, key: ShortcutKey, value: Option<AreaId>) {
        self.entries.insert(key, value);
    }
}

/// Serialized as a flat map with dotted keys, e.g. `"ward.county"`.
impl Serialize for ShortcutIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

/// Build the shortcut index for a resolved area list.
///
/// Areas are applied in order; a later area overwrites an earlier one
/// writing the same key.
pub fn build_shortcuts<'a>(areas: impl IntoIterator<Item = &'a Area>) -> ShortcutIndex {
    let mut index = ShortcutIndex::default();
    for area in areas {
        let Some(role) = AreaRole::classify(&area.type_code) else {
            continue;
        };
        match role {
            AreaRole::Ward => {
                index.set(ShortcutKey::Ward, Some(area.id));
                index.set(ShortcutKey::Council, area.parent_area_id);
            }
            AreaRole::CountyWard => {
                index.set(ShortcutKey::WardBranch(Branch::County), Some(area.id));
                index.set(
                    ShortcutKey::CouncilBranch(Branch::County),
                    area.parent_area_id,
                );
            }
            AreaRole::DistrictWard => {
                index.set(ShortcutKey::WardBranch(Branch::District), Some(area.id));
                index.set(
                    ShortcutKey::CouncilBranch(Branch::District),
                    area.parent_area_id,
                );
            }
            AreaRole::Literal => {
                index.set(ShortcutKey::TypeCode(area.type_code.clone()), Some(area.id));
            }
        }
    }
    index
}
