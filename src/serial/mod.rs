//! XML serialization.
//!
//! This module renders a `Document` tree, or any single node of it, back
//! to XML text. The output reads back through [`crate::reader`] to the same
//! structure, which is what makes parse/convert/render round trips hold.

pub mod xml;

pub use xml::{serialize, serialize_node, serialize_with_options, SerializeOptions};
