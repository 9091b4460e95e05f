//! # xmlbridge
//!
//! XML name and URI validation, and a structural bridge between the
//! order-preserving parsed form of an XML document and a DOM-like tree.
//!
//! - [`util`]: the XML Name code point classifier and Name, NCName,
//!   NMTOKEN, and `QName` validators.
//! - [`uri`]: an RFC 3986 grammar table, URL/URN values, and path objects.
//! - [`parsed`]: the order-preserving parsed tree keyed by structural
//!   property names (`@_attr`, `#text`, `?pi`, `!doctype`, ...).
//! - [`reader`]: XML text to parsed tree.
//! - [`convert`]: parsed tree to [`Document`] and back.
//! - [`serial`]: [`Document`] to XML text.
//!
//! ## Quick Start
//!
//! ```
//! use xmlbridge::Document;
//! use xmlbridge::serial::serialize;
//!
//! let doc = Document::parse_str("<root id=\"1\"><child>Hello</child></root>").unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.node_name(root), Some("root"));
//! assert_eq!(doc.attribute(root, "id"), Some("1"));
//! assert_eq!(serialize(&doc), "<root id=\"1\"><child>Hello</child></root>\n");
//! ```

pub mod convert;
pub mod error;
pub mod parsed;
pub mod reader;
pub mod serial;
pub mod tree;
pub mod uri;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use error::Error;
pub use tree::{Attribute, Document, NodeId};
