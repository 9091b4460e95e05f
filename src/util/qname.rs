//! `QName` (qualified name) handling.
//!
//! A `QName` is a name of the form `prefix:localname` or just `localname` (with
//! no prefix), optionally bound to a namespace URI. This module provides the
//! immutable [`QName`] value and utilities for splitting qualified names as
//! defined by the Namespaces in XML 1.0 specification.
//!
//! See <https://www.w3.org/TR/xml-names/#NT-QName>

use std::fmt;
use std::str::FromStr;

use crate::error::FormatError;
use crate::uri::Uri;

use super::name::{is_valid_ncname, is_valid_qname, is_valid_xml_name};

/// Splits a `QName` into its prefix and local name parts.
///
/// Returns `(Some(prefix), localname)` if the name contains a colon,
/// or `(None, localname)` if it does not.
///
/// # Examples
///
/// ```
/// use xmlbridge::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

/// Optional parts supplied when building a [`QName`] from a local name.
#[derive(Debug, Clone, Copy, Default)]
pub struct QNameOptions<'a> {
    /// Namespace prefix; must be an `NCName`.
    pub prefix: Option<&'a str>,
    /// Namespace URI; must be an absolute URI.
    pub uri: Option<&'a str>,
}

impl<'a> QNameOptions<'a> {
    /// Sets the prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Sets the namespace URI.
    #[must_use]
    pub fn uri(mut self, uri: &'a str) -> Self {
        self.uri = Some(uri);
        self
    }
}

/// An immutable qualified name.
///
/// Two names compare equal by `(uri, local_name)` when both carry a
/// namespace URI, and by `(prefix, local_name)` otherwise. Because that
/// relation is not transitive across bound and unbound names, `QName`
/// implements `PartialEq` only.
///
/// # Examples
///
/// ```
/// use xmlbridge::util::qname::{QName, QNameOptions};
///
/// let a = QName::new("item", QNameOptions::default().prefix("x")).unwrap();
/// let b: QName = "x:item".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "x:item");
/// ```
#[derive(Debug, Clone)]
pub struct QName {
    local_name: String,
    prefix: Option<String>,
    uri: Option<String>,
}

impl QName {
    /// Builds a `QName` from its parts.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if `local_name` contains a colon or is not a
    /// Name, if the prefix is not an `NCName`, or if the URI does not
    /// round-trip as an absolute URI.
    pub fn new(local_name: &str, options: QNameOptions<'_>) -> Result<Self, FormatError> {
        if local_name.contains(':') {
            return Err(FormatError::new(
                "local name must not contain a colon",
                local_name,
            ));
        }
        if !is_valid_xml_name(local_name) {
            return Err(FormatError::new("local name is not a valid XML Name", local_name));
        }
        if let Some(prefix) = options.prefix {
            if !is_valid_ncname(prefix) {
                return Err(FormatError::new("prefix is not a valid NCName", prefix));
            }
        }
        if let Some(uri) = options.uri {
            check_namespace_uri(uri)?;
        }
        Ok(Self {
            local_name: local_name.to_string(),
            prefix: options.prefix.map(str::to_string),
            uri: options.uri.map(str::to_string),
        })
    }

    /// Parses `prefix:local` or `local`.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` unless `s` is a valid `QName`.
    pub fn parse(s: &str) -> Result<Self, FormatError> {
        if !is_valid_qname(s) {
            return Err(FormatError::new("not a valid QName", s));
        }
        let (prefix, local) = split_qname(s);
        Ok(Self {
            local_name: local.to_string(),
            prefix: prefix.map(str::to_string),
            uri: None,
        })
    }

    /// Returns a copy of this name bound to a namespace URI.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if `uri` is not an absolute URI.
    pub fn with_uri(&self, uri: &str) -> Result<Self, FormatError> {
        check_namespace_uri(uri)?;
        Ok(Self {
            uri: Some(uri.to_string()),
            ..self.clone()
        })
    }

    /// The local part.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The namespace prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The namespace URI, if bound.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

fn check_namespace_uri(uri: &str) -> Result<(), FormatError> {
    match Uri::parse(uri) {
        Ok(parsed) if parsed.to_string() == uri => Ok(()),
        _ => Err(FormatError::new("namespace is not an absolute URI", uri)),
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        match (&self.uri, &other.uri) {
            (Some(a), Some(b)) => a == b && self.local_name == other.local_name,
            _ => self.prefix == other.prefix && self.local_name == other.local_name,
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

impl FromStr for QName {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qname_with_prefix() {
        assert_eq!(split_qname("xml:lang"), (Some("xml"), "lang"));
    }

    #[test]
    fn test_split_qname_without_prefix() {
        assert_eq!(split_qname("div"), (None, "div"));
    }

    #[test]
    fn test_split_qname_colon_at_edges() {
        assert_eq!(split_qname(":local"), (Some(""), "local"));
        assert_eq!(split_qname("prefix:"), (Some("prefix"), ""));
    }

    #[test]
    fn test_split_qname_multiple_colons() {
        // Only splits on first colon
        assert_eq!(split_qname("a:b:c"), (Some("a"), "b:c"));
    }

    #[test]
    fn test_new_rejects_colon_in_local_name() {
        let err = QName::new("a:b", QNameOptions::default()).unwrap_err();
        assert_eq!(err.input, "a:b");
    }

    #[test]
    fn test_new_rejects_bad_parts() {
        assert!(QName::new("1x", QNameOptions::default()).is_err());
        assert!(QName::new("x", QNameOptions::default().prefix("p:q")).is_err());
        assert!(QName::new("x", QNameOptions::default().prefix("")).is_err());
        assert!(QName::new("x", QNameOptions::default().uri("not a uri")).is_err());
        assert!(QName::new("x", QNameOptions::default().uri("relative/path")).is_err());
    }

    #[test]
    fn test_new_with_uri() {
        let name = QName::new(
            "schema",
            QNameOptions::default()
                .prefix("xs")
                .uri("http://www.w3.org/2001/XMLSchema"),
        )
        .unwrap();
        assert_eq!(name.uri(), Some("http://www.w3.org/2001/XMLSchema"));
        assert_eq!(name.to_string(), "xs:schema");
    }

    #[test]
    fn test_parse() {
        let name = QName::parse("svg:rect").unwrap();
        assert_eq!(name.prefix(), Some("svg"));
        assert_eq!(name.local_name(), "rect");
        assert_eq!(name.uri(), None);

        let bare: QName = "rect".parse().unwrap();
        assert_eq!(bare.prefix(), None);
        assert_eq!(bare.to_string(), "rect");

        assert!(QName::parse("a:b:c").is_err());
        assert!(QName::parse("").is_err());
    }

    #[test]
    fn test_equality_by_uri_when_both_bound() {
        let a = QName::parse("a:item")
            .unwrap()
            .with_uri("urn:example:ns")
            .unwrap();
        let b = QName::parse("b:item")
            .unwrap()
            .with_uri("urn:example:ns")
            .unwrap();
        assert_eq!(a, b);

        let c = QName::parse("a:item")
            .unwrap()
            .with_uri("urn:example:other")
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_equality_by_prefix_otherwise() {
        let bound = QName::parse("a:item")
            .unwrap()
            .with_uri("urn:example:ns")
            .unwrap();
        assert_eq!(bound, QName::parse("a:item").unwrap());
        assert_ne!(bound, QName::parse("b:item").unwrap());
    }
}
