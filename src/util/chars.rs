//! XML Name character classes (XML 1.0 §2.3).
//!
//! Classification works on raw code points so that callers holding UTF-16
//! units or integers from other sources can use it without first building a
//! `char`. The range tables are public: the regex class fragments in
//! [`crate::util::name`] are generated from the same data.

/// Highest Unicode scalar value.
const MAX_CODE_POINT: u32 = 0x0010_FFFF;

/// Inclusive ranges of the `NameStartChar` production `[4]`.
pub const NAME_START_RANGES: &[(u32, u32)] = &[
    (0x3A, 0x3A), // ':'
    (0x41, 0x5A), // 'A'-'Z'
    (0x5F, 0x5F), // '_'
    (0x61, 0x7A), // 'a'-'z'
    (0xC0, 0xD6),
    (0xD8, 0xF6),
    (0xF8, 0x2FF),
    (0x370, 0x37D),
    (0x37F, 0x1FFF),
    (0x200C, 0x200D),
    (0x2070, 0x218F),
    (0x2C00, 0x2FEF),
    (0x3001, 0xD7FF),
    (0xF900, 0xFDCF),
    (0xFDF0, 0xFFFD),
    (0x1_0000, 0xE_FFFF),
];

/// Inclusive ranges that `NameChar` `[4a]` adds on top of `NameStartChar`.
pub const NAME_TAIL_RANGES: &[(u32, u32)] = &[
    (0x2D, 0x2D), // '-'
    (0x2E, 0x2E), // '.'
    (0x30, 0x39), // '0'-'9'
    (0xB7, 0xB7), // middle dot
    (0x300, 0x36F),
    (0x203F, 0x2040),
];

fn in_ranges(ranges: &[(u32, u32)], cp: u32) -> bool {
    ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Returns `true` if `cp` is a `NameStartChar`.
///
/// Values beyond `U+10FFFF` are rejected rather than treated as errors.
#[must_use]
pub fn is_name_start_code_point(cp: u32) -> bool {
    cp <= MAX_CODE_POINT && in_ranges(NAME_START_RANGES, cp)
}

/// Returns `true` if `cp` is a `NameChar` (start or continuation class).
#[must_use]
pub fn is_name_continuation_code_point(cp: u32) -> bool {
    cp <= MAX_CODE_POINT && (is_name_start_code_point(cp) || in_ranges(NAME_TAIL_RANGES, cp))
}

/// `char` form of [`is_name_start_code_point`].
#[must_use]
pub fn is_name_start_char(c: char) -> bool {
    is_name_start_code_point(c as u32)
}

/// `char` form of [`is_name_continuation_code_point`].
#[must_use]
pub fn is_name_char(c: char) -> bool {
    is_name_continuation_code_point(c as u32)
}

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
///
/// The XML 1.0 (Fifth Edition) `Char` production allows:
/// `#x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`
#[must_use]
pub fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}
