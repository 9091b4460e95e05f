//! Order-preserving parsed document tree.
//!
//! This is the input side of the tree converter: the shape an
//! order-preserving XML parser emits. Every XML construct is a keyed entry
//! whose key syntax names the construct:
//!
//! | Key | Construct |
//! |---|---|
//! | `name` | element |
//! | `@_name` | attribute of the enclosing element |
//! | `#text` | character data |
//! | `#cdata`, `#cdata-section` | CDATA section |
//! | `#comment` | comment |
//! | `?target` | processing instruction (`?xml` is the XML declaration) |
//! | `!name` | document type declaration |
//!
//! Keys are kept in insertion order and may repeat, so mixed content such
//! as `a<b/>c<b/>` survives intact.
//!
//! # JSON form
//!
//! A JSON object cannot repeat a key. At the top level, content with
//! repeated keys is written as an array of single-key objects. In value
//! position an array already means repeated siblings, so repeated-key
//! content is wrapped instead: `{"#ordered": [{"#text": "a"}, {"b": ""}]}`.
//! [`ORDERED_KEY`] is never a structural key.

use crate::error::DecodeError;

/// JSON key wrapping ordered element content in value position.
pub const ORDERED_KEY: &str = "#ordered";

/// A value attached to a structural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedValue {
    /// Scalar content: attribute value, text, comment body, PI data.
    Text(String),
    /// Nested content of an element, PI, or doctype.
    Object(ParsedObject),
    /// Repeated siblings sharing one key.
    List(Vec<ParsedValue>),
}

impl ParsedValue {
    /// Returns the text if this is a [`ParsedValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object if this is a [`ParsedValue::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&ParsedObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Builds a value from JSON.
    ///
    /// Strings become text and numbers and booleans their JSON spelling;
    /// arrays become lists and objects recurse. An object whose only key is
    /// [`ORDERED_KEY`] holding an array of objects is their concatenation.
    /// `null` has no XML counterpart.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` on `null` anywhere in the value, or on an
    /// ordered wrapper holding something other than objects.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DecodeError> {
        match value {
            serde_json::Value::Null => Err(DecodeError::new("null has no XML representation")),
            serde_json::Value::Bool(b) => Ok(Self::Text(b.to_string())),
            serde_json::Value::Number(n) => Ok(Self::Text(n.to_string())),
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            serde_json::Value::Object(map) => {
                if let (1, Some(serde_json::Value::Array(items))) =
                    (map.len(), map.get(ORDERED_KEY))
                {
                    return ParsedObject::from_object_array(items)
                        .map(Self::Object)
                        .map_err(|e| e.with_key_if_unset(ORDERED_KEY));
                }
                let mut object = ParsedObject::new();
                for (key, item) in map {
                    let item = Self::from_json(item).map_err(|e| e.with_key_if_unset(key))?;
                    object.push(key.clone(), item);
                }
                Ok(Self::Object(object))
            }
        }
    }

    /// Renders this value as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Object(o) if o.has_unique_keys() => o.to_json(),
            Self::Object(o) => {
                let mut map = serde_json::Map::new();
                map.insert(ORDERED_KEY.to_string(), o.entry_array());
                serde_json::Value::Object(map)
            }
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

impl From<&str> for ParsedValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParsedValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<ParsedObject> for ParsedValue {
    fn from(o: ParsedObject) -> Self {
        Self::Object(o)
    }
}

/// An ordered, duplicate-preserving list of keyed entries.
///
/// # Examples
///
/// ```
/// use xmlbridge::parsed::ParsedObject;
///
/// let root = ParsedObject::new()
///     .with("@_id", "1")
///     .with("#text", "hi");
/// let doc = ParsedObject::new().with("root", root);
/// assert_eq!(doc.len(), 1);
/// assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["root"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedObject {
    entries: Vec<(String, ParsedValue)>,
}

impl ParsedObject {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParsedValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Appends an entry, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParsedValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParsedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParsedValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds an object from JSON.
    ///
    /// Accepts either an object, or the array-of-objects form some parsers
    /// emit to keep duplicate keys in order; the array's objects are
    /// concatenated.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the top level is neither, if an array item
    /// is not an object, or if a `null` appears anywhere.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DecodeError> {
        match value {
            serde_json::Value::Object(_) => match ParsedValue::from_json(value)? {
                ParsedValue::Object(object) => Ok(object),
                _ => Err(DecodeError::new("expected a JSON object")),
            },
            serde_json::Value::Array(items) => Self::from_object_array(items),
            _ => Err(DecodeError::new(
                "expected a JSON object or an array of objects",
            )),
        }
    }

    /// Parses JSON text, then applies [`ParsedObject::from_json`].
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` for malformed JSON or an unsupported shape.
    pub fn from_json_str(text: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| DecodeError::new(format!("invalid JSON: {e}")))?;
        Self::from_json(&value)
    }

    /// Concatenates the entries of an array of JSON objects.
    fn from_object_array(items: &[serde_json::Value]) -> Result<Self, DecodeError> {
        let mut object = Self::new();
        for (index, item) in items.iter().enumerate() {
            if !item.is_object() {
                return Err(DecodeError::new(format!(
                    "array item {index} is not an object"
                )));
            }
            let part = Self::from_json(item)?;
            object.entries.extend(part.entries);
        }
        Ok(object)
    }

    /// Renders this object as a top-level JSON document.
    ///
    /// Duplicate keys switch to the array-of-objects form, one single-key
    /// object per entry; nested values with duplicate keys use the
    /// [`ORDERED_KEY`] wrapper. [`ParsedObject::from_json`] reads the result
    /// back unchanged.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        if self.has_unique_keys() {
            let map = self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect();
            serde_json::Value::Object(map)
        } else {
            self.entry_array()
        }
    }

    fn has_unique_keys(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.keys().all(|k| seen.insert(k))
    }

    fn entry_array(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.entries
                .iter()
                .map(|(k, v)| {
                    let mut map = serde_json::Map::new();
                    map.insert(k.clone(), v.to_json());
                    serde_json::Value::Object(map)
                })
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<ParsedValue>> FromIterator<(K, V)> for ParsedObject {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
