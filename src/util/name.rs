//! Validation of XML Names, NCNames, name tokens, and qualified names.
//!
//! See XML 1.0 §2.3 productions `[5]` Name and `[7]` Nmtoken, and
//! Namespaces in XML 1.0 §3 (`NCName`) and §4 (`QName`).

use std::fmt::Write as _;

use super::chars::{
    is_name_char, is_name_continuation_code_point, is_name_start_char,
    is_name_start_code_point, NAME_START_RANGES, NAME_TAIL_RANGES,
};
use super::qname::split_qname;

/// Returns `true` if `s` is a non-empty XML `Name`.
#[must_use]
pub fn is_valid_xml_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Returns `true` if `units` is a non-empty XML `Name` encoded as UTF-16.
///
/// Surrogate pairs are decoded before classification; a lone surrogate
/// anywhere in the sequence invalidates the name.
#[must_use]
pub fn is_valid_xml_name_utf16(units: &[u16]) -> bool {
    let mut decoded = char::decode_utf16(units.iter().copied());
    match decoded.next() {
        Some(Ok(first)) if is_name_start_code_point(first as u32) => decoded.all(|r| {
            r.is_ok_and(|c| is_name_continuation_code_point(c as u32))
        }),
        _ => false,
    }
}

/// Returns `true` if `s` is a non-empty `Nmtoken`.
///
/// Unlike a `Name`, a name token may begin with any `NameChar`.
#[must_use]
pub fn is_valid_name_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_name_char)
}

/// Returns `true` if `s` is a `Name` that contains no colon.
#[must_use]
pub fn is_valid_ncname(s: &str) -> bool {
    is_valid_xml_name(s) && !s.contains(':')
}

/// Returns `true` if `s` is a valid `QName`: either an `NCName`, or two
/// `NCName`s joined by a single colon.
#[must_use]
pub fn is_valid_qname(s: &str) -> bool {
    if !is_valid_xml_name(s) {
        return false;
    }
    match split_qname(s) {
        (Some(prefix), local) => is_valid_ncname(prefix) && is_valid_ncname(local),
        (None, _) => true,
    }
}

/// Returns `true` if `s` may be used as an application identifier.
///
/// Identifiers must be XML Names and may not start with the reserved
/// `xml:` prefix in any letter case.
#[must_use]
pub fn is_valid_custom_id(s: &str) -> bool {
    let reserved = s
        .get(..4)
        .is_some_and(|head| head.eq_ignore_ascii_case("xml:"));
    is_valid_xml_name(s) && !reserved
}

fn push_class_ranges(out: &mut String, ranges: &[(u32, u32)]) {
    for &(lo, hi) in ranges {
        if lo == hi {
            let _ = write!(out, "\\x{{{lo:X}}}");
        } else {
            let _ = write!(out, "\\x{{{lo:X}}}-\\x{{{hi:X}}}");
        }
    }
}

/// Regex character class matching one `NameStartChar`.
#[must_use]
pub fn name_start_class() -> String {
    let mut class = String::from("[");
    push_class_ranges(&mut class, NAME_START_RANGES);
    class.push(']');
    class
}

/// Regex character class matching one `NameChar`.
#[must_use]
pub fn name_char_class() -> String {
    let mut class = String::from("[");
    push_class_ranges(&mut class, NAME_START_RANGES);
    push_class_ranges(&mut class, NAME_TAIL_RANGES);
    class.push(']');
    class
}

/// Unanchored regex source for the `Name` production.
#[must_use]
pub fn name_pattern() -> String {
    format!("{}{}*", name_start_class(), name_char_class())
}
