//! Structural property-type classification.
//!
//! Every key of a parsed tree names the XML construct its value describes.
//! [`classify`] maps a key to one of the six [`PropertyType`]s and extracts
//! the structural tag (element name, attribute name, PI target, doctype
//! name, or text variant). The patterns are mutually exclusive, so a
//! well-formed key matches exactly one type.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::DecodeError;
use crate::util::name::name_pattern;

/// The kind of node a structural key describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// `!name`: document type declaration.
    DocType,
    /// `?target`: processing instruction.
    ProcessInstruction,
    /// `#comment`.
    Comment,
    /// `#text`, `#cdata`, `#cdata-section`.
    TextNode,
    /// A bare Name: element.
    Element,
    /// `@_name`: attribute.
    Attribute,
}

/// Classification order for keys that are not doctype keys.
const PRIORITY: [PropertyType; 5] = [
    PropertyType::Comment,
    PropertyType::ProcessInstruction,
    PropertyType::Attribute,
    PropertyType::Element,
    PropertyType::TextNode,
];

impl PropertyType {
    /// All property types.
    pub const ALL: [PropertyType; 6] = [
        PropertyType::DocType,
        PropertyType::ProcessInstruction,
        PropertyType::Comment,
        PropertyType::TextNode,
        PropertyType::Element,
        PropertyType::Attribute,
    ];

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DocType => "DocType",
            Self::ProcessInstruction => "ProcessInstruction",
            Self::Comment => "Comment",
            Self::TextNode => "TextNode",
            Self::Element => "Element",
            Self::Attribute => "Attribute",
        }
    }

    /// The anchored key pattern. Every pattern except `Comment` captures
    /// the structural tag as the named group `tag`.
    #[must_use]
    pub fn pattern(self) -> &'static Regex {
        let table = patterns();
        match self {
            Self::DocType => &table.doc_type,
            Self::ProcessInstruction => &table.process_instruction,
            Self::Comment => &table.comment,
            Self::TextNode => &table.text_node,
            Self::Element => &table.element,
            Self::Attribute => &table.attribute,
        }
    }

    /// Matches `key` against this type's pattern and returns the tag.
    ///
    /// For `Comment` the tag is `comment`.
    #[must_use]
    pub fn match_key(self, key: &str) -> Option<&str> {
        if self == Self::Comment {
            return self.pattern().is_match(key).then_some("comment");
        }
        self.pattern()
            .captures(key)
            .and_then(|caps| caps.name("tag"))
            .map(|m| m.as_str())
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct PatternTable {
    doc_type: Regex,
    process_instruction: Regex,
    comment: Regex,
    text_node: Regex,
    element: Regex,
    attribute: Regex,
}

fn compile(source: &str) -> Regex {
    Regex::new(source).unwrap_or_else(|e| panic!("BUG: invalid property key pattern: {e}"))
}

fn patterns() -> &'static PatternTable {
    static TABLE: OnceLock<PatternTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let name = name_pattern();
        let table = PatternTable {
            doc_type: compile(&format!("^!(?P<tag>{name})$")),
            process_instruction: compile(&format!(r"^\?(?P<tag>{name})$")),
            comment: compile("^#comment$"),
            text_node: compile("^#(?P<tag>text|cdata|cdata-section)$"),
            element: compile(&format!("^(?P<tag>{name})$")),
            attribute: compile(&format!("^@_(?P<tag>{name})$")),
        };
        tracing::debug!("property key pattern table built");
        table
    })
}

/// A classified key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified<'k> {
    /// The property type.
    pub kind: PropertyType,
    /// The structural tag captured from the key.
    pub tag: &'k str,
}

/// Classifies a structural key.
///
/// Doctype keys are recognized first; the remaining types are tried in the
/// order comment, processing instruction, attribute, element, text.
///
/// # Errors
///
/// Returns `DecodeError` ("unknown property type") if no pattern matches.
///
/// # Examples
///
/// ```
/// use xmlbridge::convert::property::{classify, PropertyType};
///
/// let c = classify("@_id").unwrap();
/// assert_eq!((c.kind, c.tag), (PropertyType::Attribute, "id"));
/// assert!(classify("123bad").is_err());
/// ```
pub fn classify(key: &str) -> Result<Classified<'_>, DecodeError> {
    std::iter::once(PropertyType::DocType)
        .chain(PRIORITY)
        .find_map(|kind| kind.match_key(key).map(|tag| Classified { kind, tag }))
        .ok_or_else(|| DecodeError::for_key("unknown property type", key))
}

/// Escapes every `"` in an attribute value as `&quot;`.
#[must_use]
pub fn escape_attribute(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// Reverts the first `&quot;` in `value` to `"`.
///
/// Only the first occurrence is reverted, so this is not a full inverse of
/// [`escape_attribute`] for values with more than one quote.
#[must_use]
pub fn unescape_attribute(value: &str) -> String {
    value.replacen("&quot;", "\"", 1)
}
