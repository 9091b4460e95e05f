//! The minimal target-tree interface the converter writes through.
//!
//! A sink hands out opaque node handles and knows how to create and link
//! nodes. [`Document`] is the in-crate implementation; a host with its own
//! DOM can implement the trait and reuse the converter unchanged.

use super::{Attribute, Document, NodeId, NodeKind, NodeType};

/// A tree the converter can build into.
///
/// Handles returned by the `create_*` methods are detached until they are
/// linked with [`append_child`](TreeSink::append_child),
/// [`splice_fragment`](TreeSink::splice_fragment), or
/// [`set_document_type`](TreeSink::set_document_type). Attributes are not
/// nodes of their own here; they are set on an element by name.
pub trait TreeSink {
    /// Opaque node reference.
    type Handle: Copy + std::fmt::Debug;

    /// The document node.
    fn document(&self) -> Self::Handle;

    /// The type of a node.
    fn node_type(&self, node: Self::Handle) -> NodeType;

    /// Creates an element.
    fn create_element(&mut self, name: &str) -> Self::Handle;

    /// Creates a text node.
    fn create_text(&mut self, content: &str) -> Self::Handle;

    /// Creates a CDATA section.
    fn create_cdata(&mut self, content: &str) -> Self::Handle;

    /// Creates a comment.
    fn create_comment(&mut self, content: &str) -> Self::Handle;

    /// Creates a processing instruction. Empty `data` means none.
    fn create_processing_instruction(&mut self, target: &str, data: &str) -> Self::Handle;

    /// Creates a document type declaration.
    fn create_document_type(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Self::Handle;

    /// Creates an empty document fragment.
    fn create_fragment(&mut self) -> Self::Handle;

    /// Appends `child` to `parent`.
    fn append_child(&mut self, parent: Self::Handle, child: Self::Handle);

    /// Moves the children of `fragment` to the end of `parent`.
    fn splice_fragment(&mut self, parent: Self::Handle, fragment: Self::Handle);

    /// Sets an attribute on `element`, replacing one with the same name.
    fn set_attribute_value(&mut self, element: Self::Handle, name: &str, value: &str);

    /// Installs the document type declaration, replacing any existing one.
    /// A new declaration goes before the root element.
    fn set_document_type(&mut self, doctype: Self::Handle);

    /// Records the XML declaration.
    fn set_xml_declaration(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<bool>,
    );
}

impl TreeSink for Document {
    type Handle = NodeId;

    fn document(&self) -> NodeId {
        self.root()
    }

    fn node_type(&self, node: NodeId) -> NodeType {
        Document::node_type(self, node)
    }

    fn create_element(&mut self, name: &str) -> NodeId {
        self.create_node(NodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    fn create_text(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Text {
            content: content.to_string(),
        })
    }

    fn create_cdata(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::CData {
            content: content.to_string(),
        })
    }

    fn create_comment(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Comment {
            content: content.to_string(),
        })
    }

    fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        self.create_node(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: (!data.is_empty()).then(|| data.to_string()),
        })
    }

    fn create_document_type(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> NodeId {
        self.create_node(NodeKind::DocumentType {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        })
    }

    fn create_fragment(&mut self) -> NodeId {
        self.create_node(NodeKind::DocumentFragment)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        Document::append_child(self, parent, child);
    }

    fn splice_fragment(&mut self, parent: NodeId, fragment: NodeId) {
        self.splice_children(parent, fragment);
    }

    fn set_attribute_value(&mut self, element: NodeId, name: &str, value: &str) {
        self.set_attribute(element, Attribute::new(name, value));
    }

    fn set_document_type(&mut self, doctype: NodeId) {
        Document::set_document_type(self, doctype);
    }

    fn set_xml_declaration(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) {
        self.version = version.map(str::to_string);
        self.encoding = encoding.map(str::to_string);
        self.standalone = standalone;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_builds_document() {
        let mut doc = Document::new();
        let root = TreeSink::document(&doc);
        let e = doc.create_element("e");
        doc.set_attribute_value(e, "k", "v");
        doc.set_attribute_value(e, "k", "w");
        let t = doc.create_text("x");
        TreeSink::append_child(&mut doc, e, t);
        TreeSink::append_child(&mut doc, root, e);

        assert_eq!(TreeSink::node_type(&doc, e), NodeType::Element);
        assert_eq!(doc.attributes(e), &[Attribute::new("k", "w")]);
        assert_eq!(doc.text_content(root), "x");
        // Placeholder, document, element, text: attributes take no slot.
        assert_eq!(doc.nodes.len(), 4);
    }

    #[test]
    fn test_empty_pi_data_is_none() {
        let mut doc = Document::new();
        let pi = doc.create_processing_instruction("t", "");
        assert_eq!(doc.node_text(pi), None);
    }

    #[test]
    fn test_set_xml_declaration() {
        let mut doc = Document::new();
        doc.set_xml_declaration(Some("1.0"), None, Some(true));
        assert_eq!(doc.version.as_deref(), Some("1.0"));
        assert_eq!(doc.encoding, None);
        assert_eq!(doc.standalone, Some(true));
    }
}
