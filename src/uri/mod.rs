//! URI and URN values built on the RFC 3986 grammar.
//!
//! A [`Uri`] is a tagged value: [`UriKind::Url`] may carry an authority,
//! query, and fragment, while [`UriKind::Urn`] forbids all three. Both kinds
//! require a scheme and a path. Field combinations are checked when the
//! value is built; after that it is immutable.
//!
//! [`valid_uri`] answers the looser question "would this candidate make a
//! valid URI?" for text, for already-built values, for loose field records,
//! and for JSON values handed over by other tools.

pub mod grammar;
pub mod path;

use std::fmt;

use crate::error::{Error, FormatError, RangeError};

use grammar::{grammar, PathContext};
use path::{Path, PathOptions};

/// Whether a URI locates (URL) or names (URN) a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriKind {
    /// A locator; may carry authority, query, and fragment.
    Url,
    /// A name; authority, query, and fragment are forbidden.
    Urn,
}

impl fmt::Display for UriKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => f.write_str("URL"),
            Self::Urn => f.write_str("URN"),
        }
    }
}

/// Loose URI components, before validation.
///
/// Components are stored without their delimiters: no `:` after the
/// scheme, no `//` before the authority, no `?` or `#`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriFields {
    /// Scheme (mandatory).
    pub scheme: Option<String>,
    /// Authority (`userinfo@host:port`).
    pub authority: Option<String>,
    /// Path (mandatory, may be empty).
    pub path: Option<String>,
    /// Query.
    pub query: Option<String>,
    /// Fragment.
    pub fragment: Option<String>,
}

impl UriFields {
    fn present_forbidden_for_urn(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.authority.is_some() {
            fields.push("authority");
        }
        if self.query.is_some() {
            fields.push("query");
        }
        if self.fragment.is_some() {
            fields.push("fragment");
        }
        fields
    }

    fn missing_mandatory(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.scheme.is_none() {
            fields.push("scheme");
        }
        if self.path.is_none() {
            fields.push("path");
        }
        fields
    }

    /// Checks every present component against its production. The path is
    /// checked in the context the authority gives it.
    fn first_malformed(&self) -> Option<(&'static str, &str)> {
        let g = grammar();
        let checks = [
            ("scheme", self.scheme.as_deref(), &g.scheme),
            ("authority", self.authority.as_deref(), &g.authority_body),
            ("query", self.query.as_deref(), &g.query_body),
            ("fragment", self.fragment.as_deref(), &g.query_body),
        ];
        for (field, value, re) in checks {
            if let Some(value) = value {
                if !re.is_match(value) {
                    return Some((field, value));
                }
            }
        }
        let context = if self.authority.is_some() {
            PathContext::AfterAuthority
        } else {
            PathContext::AfterScheme
        };
        match self.path.as_deref() {
            Some(path) if !g.path(context).is_match(path) => Some(("path", path)),
            _ => None,
        }
    }

    /// Returns `true` if mandatory components are present and every present
    /// component is well-formed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing_mandatory().is_empty() && self.first_malformed().is_none()
    }
}

/// A validated URL or URN.
///
/// # Examples
///
/// ```
/// use xmlbridge::uri::{Uri, UriKind};
///
/// let uri = Uri::parse("https://example.com/a/b?q=1#top").unwrap();
/// assert_eq!(uri.kind(), UriKind::Url);
/// assert_eq!(uri.authority(), Some("example.com"));
/// assert_eq!(uri.path().segments(), vec!["", "a", "b"]);
/// assert_eq!(uri.to_string(), "https://example.com/a/b?q=1#top");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Uri {
    kind: UriKind,
    scheme: String,
    authority: Option<String>,
    path: Path,
    query: Option<String>,
    fragment: Option<String>,
}

impl Uri {
    /// Validates `fields` as a URI of the given kind.
    ///
    /// # Errors
    ///
    /// - `RangeError` naming every missing mandatory field, or every field
    ///   a URN may not carry.
    /// - `FormatError` for the first component that does not match its
    ///   production.
    pub fn new(kind: UriKind, fields: &UriFields) -> Result<Self, Error> {
        let (Some(scheme), Some(path)) = (&fields.scheme, &fields.path) else {
            return Err(RangeError::with_fields(
                format!("{kind} requires scheme and path"),
                fields.missing_mandatory(),
            )
            .into());
        };
        if kind == UriKind::Urn {
            let forbidden = fields.present_forbidden_for_urn();
            if !forbidden.is_empty() {
                return Err(RangeError::with_fields(
                    "URN may not carry authority, query or fragment",
                    forbidden,
                )
                .into());
            }
        }
        if let Some((field, value)) = fields.first_malformed() {
            return Err(FormatError::new(format!("malformed URI {field}"), value).into());
        }

        let path = Path::parse(path, &PathOptions::uri())
            .map_err(|e| FormatError::new(e.message, path.as_str()))?;
        Ok(Self {
            kind,
            scheme: scheme.clone(),
            authority: fields.authority.clone(),
            path,
            query: fields.query.clone(),
            fragment: fields.fragment.clone(),
        })
    }

    /// Parses an absolute URI.
    ///
    /// The kind is [`UriKind::Urn`] when the scheme is `urn` in any case,
    /// [`UriKind::Url`] otherwise. Rendering the result with `Display` gives
    /// back `s`.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if `s` is not an absolute URI, or `RangeError`
    /// if it is a URN with a query or fragment.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let caps = grammar()
            .uri
            .captures(s)
            .ok_or_else(|| FormatError::new("not an absolute URI", s))?;
        let text = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        let scheme = text("scheme");
        let kind = if scheme
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("urn"))
        {
            UriKind::Urn
        } else {
            UriKind::Url
        };
        let fields = UriFields {
            scheme,
            authority: text("authority"),
            path: text("abempty").or_else(|| text("path")),
            query: text("query"),
            fragment: text("fragment"),
        };
        Self::new(kind, &fields)
    }

    /// The kind.
    #[must_use]
    pub fn kind(&self) -> UriKind {
        self.kind
    }

    /// The scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The authority, without the leading `//`.
    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// The path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The query, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The fragment, without the leading `#`.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// This value's components as a loose record.
    #[must_use]
    pub fn fields(&self) -> UriFields {
        UriFields {
            scheme: Some(self.scheme.clone()),
            authority: self.authority.clone(),
            path: Some(self.path.to_string()),
            query: self.query.clone(),
            fragment: self.fragment.clone(),
        }
    }

    /// Returns a copy with `path` in place of the current path.
    ///
    /// # Errors
    ///
    /// Returns `RangeError` if `path` uses a different delimiter or
    /// absolute-path policy, or if its text is not a legal path for this
    /// URI.
    pub fn with_path(&self, path: Path) -> Result<Self, RangeError> {
        if !self.path.is_compatible(&path) {
            return Err(RangeError::new(
                "path delimiter or absolute-path policy differs from the URI's",
            ));
        }
        let context = if self.authority.is_some() {
            PathContext::AfterAuthority
        } else {
            PathContext::AfterScheme
        };
        let text = path.to_string();
        if !grammar().path(context).is_match(&text) {
            return Err(RangeError::with_fields(
                format!("path {text:?} is not allowed here"),
                ["path"],
            ));
        }
        Ok(Self {
            path,
            ..self.clone()
        })
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(authority) = &self.authority {
            write!(f, "//{authority}")?;
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// Something that may or may not describe a valid URI.
#[derive(Debug, Clone, Copy)]
pub enum UriCandidate<'a> {
    /// URI text; must be an absolute URI.
    Text(&'a str),
    /// An already-validated value; always valid.
    Uri(&'a Uri),
    /// A component record; checked field by field.
    Fields(&'a UriFields),
    /// A JSON value: strings are checked as text, objects as component
    /// records, everything else is invalid.
    Json(&'a serde_json::Value),
}

impl<'a> From<&'a str> for UriCandidate<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a Uri> for UriCandidate<'a> {
    fn from(uri: &'a Uri) -> Self {
        Self::Uri(uri)
    }
}

impl<'a> From<&'a UriFields> for UriCandidate<'a> {
    fn from(fields: &'a UriFields) -> Self {
        Self::Fields(fields)
    }
}

impl<'a> From<&'a serde_json::Value> for UriCandidate<'a> {
    fn from(value: &'a serde_json::Value) -> Self {
        Self::Json(value)
    }
}

fn fields_from_json(map: &serde_json::Map<String, serde_json::Value>) -> Option<UriFields> {
    let field = |name: &str| -> Result<Option<String>, ()> {
        match map.get(name) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(()),
        }
    };
    Some(UriFields {
        scheme: field("scheme").ok()?,
        authority: field("authority").ok()?,
        path: field("path").ok()?,
        query: field("query").ok()?,
        fragment: field("fragment").ok()?,
    })
}

/// Returns `true` if `candidate` describes a valid URI.
///
/// ```
/// use xmlbridge::uri::{valid_uri, UriFields};
///
/// assert!(valid_uri("http://example.com/"));
/// assert!(!valid_uri("not a uri"));
///
/// let fields = UriFields {
///     scheme: Some("urn".into()),
///     path: Some("isbn:0451450523".into()),
///     ..UriFields::default()
/// };
/// assert!(valid_uri(&fields));
/// ```
pub fn valid_uri<'a>(candidate: impl Into<UriCandidate<'a>>) -> bool {
    match candidate.into() {
        UriCandidate::Text(s) => grammar::is_absolute_uri(s),
        UriCandidate::Uri(_) => true,
        UriCandidate::Fields(fields) => fields.is_valid(),
        UriCandidate::Json(value) => match value {
            serde_json::Value::String(s) => grammar::is_absolute_uri(s),
            serde_json::Value::Object(map) => {
                fields_from_json(map).is_some_and(|fields| fields.is_valid())
            }
            _ => false,
        },
    }
}
