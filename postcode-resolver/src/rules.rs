//! Country-specific postcode rules.
//!
//! The resolver never hard-codes a country: canonicalisation and the
//! "special postcode" predicate come from an injected [`PostcodeRules`]
//! value. Both methods have defaults, so [`DefaultRules`] (identity, nothing
//! special) behaves exactly as if no rules were configured.

use crate::validate::normalize;

/// Postcode rules for one country or dataset.
pub trait PostcodeRules: Send + Sync {
    /// Map a raw user string to the dataset's canonical form.
    fn canonicalise(&self, raw: &str) -> String {
        raw.to_string()
    }

    /// Postcodes for which area resolution is meaningless.
    fn is_special(&self, _code: &str) -> bool {
        false
    }
}

/// No canonicalisation, nothing special.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRules;

impl PostcodeRules for DefaultRules {}

/// Great Britain.
///
/// Crown Dependency postcodes (Jersey, Guernsey, Isle of Man) are in the
/// postcode file but outside every boundary set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GbRules;

const CROWN_DEPENDENCIES: &[&str] = &["JE", "GY", "IM"];

impl PostcodeRules for GbRules {
    fn canonicalise(&self, raw: &str) -> String {
        normalize(raw)
    }

    fn is_special(&self, code: &str) -> bool {
        CROWN_DEPENDENCIES
            .iter()
            .any(|prefix| code.starts_with(prefix))
    }
}
