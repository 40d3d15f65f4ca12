//! Postcode format validation.
//!
//! Pure syntax checks. Both checks normalize first (uppercase, whitespace
//! removed), so `"sw1a 1aa"` and `"SW1A1AA"` are equally valid.
//!
//! ```text
//! full    = outward inward
//! partial = outward
//! outward = A9 | A99 | AA9 | AA99 | A9A | AA9A
//! inward  = 9AA
//! ```
//!
//! with letters restricted per position.

use crate::error::{ResolveError, Result};
use regex::Regex;
use std::sync::OnceLock;

const FIRST: &str = "ABCDEFGHIJKLMNOPRSTUWYZ";
const SECOND: &str = "ABCDEFGHJKLMNOPQRSTUVWXY";
const THIRD: &str = "ABCDEFGHJKSTUW";
const FOURTH: &str = "ABEHMNPRVWXY";
const INWARD: &str = "ABDEFGHJLNPQRSTUWXYZ";

/// Reserved test postcodes outside the grammar.
const TEST_POSTCODES: &[&str] = &["ZZ99ZZ", "ZZ99ZY"];
const TEST_PARTIAL: &str = "ZZ9";

struct Grammar {
    full: Regex,
    partial: Regex,
    inward_suffix: Regex,
}

fn grammar() -> Option<&'static Grammar> {
    static GRAMMAR: OnceLock<Option<Grammar>> = OnceLock::new();
    GRAMMAR
        .get_or_init(|| {
            let outward = format!(
                "[{FIRST}][1-9][0-9]?|[{FIRST}][{SECOND}][0-9]|[{FIRST}][{SECOND}][1-9][0-9]\
                 |[{FIRST}][1-9][{THIRD}]|[{FIRST}][{SECOND}][1-9][{FOURTH}]"
            );
            Some(Grammar {
                full: Regex::new(&format!("^(?:{outward})[0-9][{INWARD}]{{2}}$")).ok()?,
                partial: Regex::new(&format!("^(?:{outward})$")).ok()?,
                inward_suffix: Regex::new("[0-9][A-Z]{2}$").ok()?,
            })
        })
        .as_ref()
}

/// Uppercase and remove all whitespace.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Check a full postcode.
pub fn is_valid_full(code: &str) -> bool {
    let code = normalize(code);
    if TEST_POSTCODES.contains(&code.as_str()) {
        return true;
    }
    grammar().is_some_and(|g| g.full.is_match(&code))
}

/// Check a partial postcode. A full postcode is reduced to its outward
/// code first, so it is also a valid partial.
pub fn is_valid_partial(code: &str) -> bool {
    let code = to_partial(code);
    if code == TEST_PARTIAL {
        return true;
    }
    grammar().is_some_and(|g| g.partial.is_match(&code))
}

/// Normalize, and strip the inward code if the input is a full postcode.
pub fn to_partial(code: &str) -> String {
    let code = normalize(code);
    if is_valid_full(&code) {
        strip_inward(&code).to_string()
    } else {
        code
    }
}

/// Remove a trailing inward code (digit and two letters), if present.
pub fn strip_inward(code: &str) -> &str {
    match grammar().and_then(|g| g.inward_suffix.find(code)) {
        Some(m) => &code[..m.start()],
        None => code,
    }
}

/// Normalize and validate a full postcode.
pub fn validate_full(raw: &str) -> Result<String> {
    let code = normalize(raw);
    if code.is_empty() || !is_valid_full(&code) {
        return Err(ResolveError::invalid_postcode(raw));
    }
    Ok(code)
}

/// Normalize and validate a partial postcode.
pub fn validate_partial(raw: &str) -> Result<String> {
    let code = to_partial(raw);
    if code.is_empty() || !is_valid_partial(&code) {
        return Err(ResolveError::invalid_partial(code));
    }
    Ok(code)
}

/// Presentation form, with a space before the inward code.
pub fn display_postcode(code: &str) -> String {
    let code = normalize(code);
    let outward = strip_inward(&code);
    if outward.is_empty() || outward.len() == code.len() {
        return code;
    }
    format!("{} {}", outward, &code[outward.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_postcodes() {
        for code in [
            "SW1A1AA", "sw1a 1aa", "M11AE", "B338TH", "CR26XH", "DN551PT", "W1A0AX", "EC1A1BB",
            "ZZ99ZZ", "ZZ9 9ZY",
        ] {
            assert!(is_valid_full(code), "{code} should be valid");
        }
        for code in ["", "   ", "SW1A", "SW1A1A", "QW11AA", "SW1A1AAX", "SW1A1CA", "12345"] {
            assert!(!is_valid_full(code), "{code} should be invalid");
        }
    }

    #[test]
    fn test_partial_postcodes() {
        for code in ["SW1A", "sw1", "M1", "B33", "CR2", "W1A", "EC1A", "ZZ9", "SW1A 1AA"] {
            assert!(is_valid_partial(code), "{code} should be valid");
        }
        for code in ["", " ", "S", "1A", "SW1A1", "QW1"] {
            assert!(!is_valid_partial(code), "{code} should be invalid");
        }
    }

    #[test]
    fn test_partial_round_trip() {
        assert_eq!(to_partial("sw1a 1aa"), "SW1A");
        assert_eq!(to_partial("SW1A"), "SW1A");
        assert_eq!(to_partial(&to_partial("M1 1AE")), "M1");
    }

    #[test]
    fn test_validate_carries_input() {
        let err = validate_full("not a postcode").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidFormat { ref input, .. } if input == "not a postcode"
        ));
        assert!(validate_full("  ").is_err());
        assert_eq!(validate_full("sw1a 1aa").unwrap(), "SW1A1AA");
        assert_eq!(validate_partial("sw1a 1aa").unwrap(), "SW1A");
    }

    #[test]
    fn test_display_postcode() {
        assert_eq!(display_postcode("SW1A1AA"), "SW1A 1AA");
        assert_eq!(display_postcode("m11ae"), "M1 1AE");
        assert_eq!(display_postcode("SW1A"), "SW1A");
    }
}
