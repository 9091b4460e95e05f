//! Error types for name validation, URI grammar checks, tree conversion,
//! and XML reading.
//!
//! The taxonomy mirrors the kinds of failure the crate can produce:
//!
//! - [`FormatError`]: malformed Name, NCName, `QName`, or URI text.
//! - [`RangeError`]: a structurally valid value that violates a policy
//!   (a URN carrying an authority, an illegal path segment, ...).
//! - [`DecodeError`]: an unrecognized structural key or a node kind that
//!   is not allowed where it appears during tree conversion.
//! - [`ParseError`]: malformed XML text handed to the reader, with the
//!   source location of the failure.
//!
//! All errors are raised synchronously and bubble unchanged to the caller.
//! [`Error`] unifies them for entry points that span several stages.

use std::fmt;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Malformed lexical input: an invalid Name, NCName, `QName`, or URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// Human-readable description of what is wrong.
    pub message: String,
    /// The offending input text.
    pub input: String,
}

impl FormatError {
    /// Creates a new `FormatError` for `input`.
    pub fn new(message: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            input: input.into(),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "format error: {} (input: {:?})", self.message, self.input)
    }
}

impl std::error::Error for FormatError {}

/// A value that is well-formed but not permitted by policy.
///
/// When several fields of a record are at fault, `fields` names every one
/// of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeError {
    /// Human-readable description of the violation.
    pub message: String,
    /// Names of the offending fields, if the value is a record.
    pub fields: Vec<String>,
}

impl RangeError {
    /// Creates a new `RangeError` with no field list.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a new `RangeError` naming the offending fields.
    pub fn with_fields<I, S>(message: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message: message.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range error: {}", self.message)?;
        if !self.fields.is_empty() {
            write!(f, " [{}]", self.fields.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for RangeError {}

/// A structural failure while converting a parsed tree into a target tree.
///
/// Conversion never skips content it does not understand: the first
/// `DecodeError` aborts the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Human-readable description of the failure.
    pub message: String,
    /// The structural property key being converted, if any.
    pub key: Option<String>,
}

impl DecodeError {
    /// Creates a new `DecodeError` that is not tied to a particular key.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: None,
        }
    }

    /// Creates a new `DecodeError` for the given property key.
    pub fn for_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Attaches `key` unless the error already names a deeper one.
    #[must_use]
    pub fn with_key_if_unset(mut self, key: impl Into<String>) -> Self {
        if self.key.is_none() {
            self.key = Some(key.into());
        }
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "decode error at {key:?}: {}", self.message),
            None => write!(f, "decode error: {}", self.message),
        }
    }
}

impl std::error::Error for DecodeError {}

/// The error type returned when XML text cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// See [`FormatError`].
    Format(FormatError),
    /// See [`RangeError`].
    Range(RangeError),
    /// See [`DecodeError`].
    Decode(DecodeError),
    /// See [`ParseError`].
    Parse(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => e.fmt(f),
            Self::Range(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
            Self::Parse(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format(e) => Some(e),
            Self::Range(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<RangeError> for Error {
    fn from(e: RangeError) -> Self {
        Self::Range(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}
