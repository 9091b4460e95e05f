//! Delimited path values.
//!
//! A [`Path`] is an ordered sequence of validated segments. The delimiter,
//! whether a leading empty segment (an absolute path) is allowed, and the
//! per-segment validator are fixed at construction. Paths are immutable:
//! [`Path::segments`] hands out a copy.

use std::fmt;
use std::sync::Arc;

use crate::error::RangeError;

use super::grammar::grammar;

/// A predicate deciding whether a single path segment is acceptable.
pub type SegmentValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Construction options for a [`Path`].
///
/// ```
/// use xmlbridge::uri::path::{Path, PathOptions};
///
/// let opts = PathOptions::default().delimiter('.').allow_absolute(false);
/// let path = Path::parse("com.example.app", &opts).unwrap();
/// assert_eq!(path.segments(), vec!["com", "example", "app"]);
/// ```
pub struct PathOptions {
    /// Separator placed between segments (default `/`).
    pub delimiter: char,
    /// Whether the first segment may be empty, marking an absolute path
    /// (default `true`).
    pub allow_absolute: bool,
    /// Segment predicate (default: a non-empty RFC 3986 `segment-nz`).
    pub segment_validator: SegmentValidator,
}

impl Clone for PathOptions {
    fn clone(&self) -> Self {
        Self {
            delimiter: self.delimiter,
            allow_absolute: self.allow_absolute,
            segment_validator: Arc::clone(&self.segment_validator),
        }
    }
}

impl fmt::Debug for PathOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathOptions")
            .field("delimiter", &self.delimiter)
            .field("allow_absolute", &self.allow_absolute)
            .field("segment_validator", &"...")
            .finish()
    }
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            delimiter: '/',
            allow_absolute: true,
            segment_validator: Arc::new(|s: &str| grammar().segment_nz.is_match(s)),
        }
    }
}

impl PathOptions {
    /// Options for the path component of a URI: any RFC 3986 `segment`,
    /// including empty ones.
    #[must_use]
    pub fn uri() -> Self {
        Self::default().segment_validator(|s| grammar().segment.is_match(s))
    }

    /// Sets the delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Allows or forbids a leading empty segment.
    #[must_use]
    pub fn allow_absolute(mut self, yes: bool) -> Self {
        self.allow_absolute = yes;
        self
    }

    /// Sets the segment validator.
    #[must_use]
    pub fn segment_validator(
        mut self,
        validator: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.segment_validator = Arc::new(validator);
        self
    }
}

/// An immutable sequence of path segments.
#[derive(Clone)]
pub struct Path {
    segments: Vec<String>,
    options: PathOptions,
}

impl Path {
    /// Builds a path from segments.
    ///
    /// # Errors
    ///
    /// Returns `RangeError` if a segment fails the validator, unless it is
    /// an empty first segment and absolute paths are allowed.
    pub fn new<I, S>(segments: I, options: &PathOptions) -> Result<Self, RangeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for (index, segment) in segments.iter().enumerate() {
            let absolute_marker = index == 0 && segment.is_empty() && options.allow_absolute;
            if !absolute_marker && !(options.segment_validator)(segment) {
                return Err(RangeError::new(format!(
                    "invalid path segment {segment:?} at index {index}"
                )));
            }
        }
        Ok(Self {
            segments,
            options: options.clone(),
        })
    }

    /// Splits `s` on the delimiter and builds a path from the pieces.
    ///
    /// The empty string is the empty path.
    ///
    /// # Errors
    ///
    /// See [`Path::new`].
    pub fn parse(s: &str, options: &PathOptions) -> Result<Self, RangeError> {
        if s.is_empty() {
            return Self::new(Vec::<String>::new(), options);
        }
        Self::new(s.split(options.delimiter), options)
    }

    /// A copy of the segments.
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        self.segments.clone()
    }

    /// The delimiter.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.options.delimiter
    }

    /// Whether this path permits a leading empty segment.
    #[must_use]
    pub fn allows_absolute(&self) -> bool {
        self.options.allow_absolute
    }

    /// Whether the path starts with the absolute marker.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.segments.len() > 1 && self.segments[0].is_empty()
    }

    /// Whether the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `other` may stand in for this path: same delimiter and same
    /// absolute-path policy.
    #[must_use]
    pub fn is_compatible(&self, other: &Path) -> bool {
        self.options.delimiter == other.options.delimiter
            && self.options.allow_absolute == other.options.allow_absolute
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.is_compatible(other) && self.segments == other.segments
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("segments", &self.segments)
            .field("delimiter", &self.options.delimiter)
            .field("allow_absolute", &self.options.allow_absolute)
            .finish()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 4];
        let delimiter: &str = self.options.delimiter.encode_utf8(&mut buf);
        f.write_str(&self.segments.join(delimiter))
    }
}
