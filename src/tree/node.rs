//! Node type definitions.
//!
//! The `NodeKind` enum represents every node type the tree converter can
//! produce. Each variant carries the node-type-specific payload (element
//! name and attributes, text content, and so on).

use super::Attribute;

/// The kind of a node and its associated data.
///
/// This enum carries the payload for each node type. Navigation links
/// (parent, children, siblings) are stored in `NodeData`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node; there is exactly one per `Document`.
    Document,

    /// A detached container whose children are spliced into a parent when
    /// it is inserted.
    DocumentFragment,

    /// An element node, e.g., `<div class="x">`.
    Element {
        /// The element's qualified name.
        name: String,
        /// Attributes on this element, in insertion order.
        attributes: Vec<Attribute>,
    },

    /// A free-standing attribute node, before it is set on an element.
    Attribute(Attribute),

    /// A text node containing character data.
    Text {
        /// The text content (logical characters, no escaping).
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The CDATA content (no escaping applied).
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text (without the `<!--` and `-->` delimiters).
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target (e.g., `"xml-stylesheet"`).
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// A document type declaration node, e.g., `<!DOCTYPE html>`.
    ///
    /// See XML 1.0 §2.8: `[28]` doctypedecl
    DocumentType {
        /// The root element name declared in the DOCTYPE.
        name: String,
        /// The SYSTEM identifier (URI), if any.
        system_id: Option<String>,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
    },
}

impl NodeKind {
    /// The coarse node type of this kind.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::DocumentFragment => NodeType::DocumentFragment,
            Self::Element { .. } => NodeType::Element,
            Self::Attribute(_) => NodeType::Attribute,
            Self::Text { .. } => NodeType::Text,
            Self::CData { .. } => NodeType::CData,
            Self::Comment { .. } => NodeType::Comment,
            Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            Self::DocumentType { .. } => NodeType::DocumentType,
        }
    }
}

/// Node type discriminator, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Document node.
    Document,
    /// Document fragment.
    DocumentFragment,
    /// Element.
    Element,
    /// Attribute.
    Attribute,
    /// Character data.
    Text,
    /// CDATA section.
    CData,
    /// Comment.
    Comment,
    /// Processing instruction.
    ProcessingInstruction,
    /// Document type declaration.
    DocumentType,
}
