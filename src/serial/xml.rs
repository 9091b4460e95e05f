//! XML serializer.
//!
//! Renders a [`Document`], or any node of one, as XML text that the reader
//! parses back to the same structure.

use std::fmt::Write;

use crate::tree::{Document, NodeId, NodeKind};

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use xmlbridge::Document;
/// use xmlbridge::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
/// assert!(xml.contains("  <child>"));
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
    /// Whether to emit an XML declaration for a document that carries no
    /// declaration fields. Defaults to `false`.
    pub xml_declaration: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
            xml_declaration: false,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented (pretty-printed) output.
    ///
    /// When enabled, child elements are placed on their own lines with
    /// indentation. Mixed-content elements (those containing both text and
    /// element children) are not indented. Disabled by default.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    ///
    /// Only takes effect when [`indent`](Self::indent) is enabled.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Forces an XML declaration (defaulting to version 1.0) even when the
    /// document records none.
    #[must_use]
    pub fn xml_declaration(mut self, yes: bool) -> Self {
        self.xml_declaration = yes;
        self
    }
}

/// Serializes a document to an XML string.
///
/// The XML declaration is written when the document has a version,
/// encoding, or standalone flag. Every top-level node ends with a newline.
///
/// # Examples
///
/// ```
/// use xmlbridge::Document;
/// use xmlbridge::serial::serialize;
///
/// let doc = Document::parse_str("<?xml version=\"1.0\"?><root><child>Hello</child></root>").unwrap();
/// assert_eq!(serialize(&doc), "<?xml version=\"1.0\"?>\n<root><child>Hello</child></root>\n");
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document to an XML string with the given options.
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    let mut output = String::new();

    let has_declaration =
        doc.version.is_some() || doc.encoding.is_some() || doc.standalone.is_some();
    if has_declaration || options.xml_declaration {
        let version = doc.version.as_deref().unwrap_or("1.0");
        output.push_str("<?xml version=\"");
        output.push_str(version);
        output.push('"');
        if let Some(ref encoding) = doc.encoding {
            output.push_str(" encoding=\"");
            output.push_str(encoding);
            output.push('"');
        }
        if let Some(standalone) = doc.standalone {
            output.push_str(" standalone=\"");
            output.push_str(if standalone { "yes" } else { "no" });
            output.push('"');
        }
        output.push_str("?>\n");
    }

    for child in doc.children(doc.root()) {
        write_node(doc, child, &mut output, options, 0, false);
        if !output.ends_with('\n') {
            output.push('\n');
        }
    }

    output
}

/// Serializes a single node and its subtree.
///
/// Every node kind renders: an attribute node as `name="value"`, a
/// fragment as its children in order, and the document node exactly as
/// [`serialize`] does.
///
/// # Examples
///
/// ```
/// use xmlbridge::Document;
/// use xmlbridge::serial::serialize_node;
///
/// let doc = Document::parse_str("<root><child a=\"1\">Hello</child></root>").unwrap();
/// let root = doc.root_element().unwrap();
/// let child = doc.first_child(root).unwrap();
/// assert_eq!(serialize_node(&doc, child), "<child a=\"1\">Hello</child>");
/// ```
#[must_use]
pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    if id == doc.root() {
        return serialize(doc);
    }
    let mut output = String::new();
    write_node(doc, id, &mut output, &SerializeOptions::default(), 0, false);
    output
}

/// Returns `true` if the element contains only other elements (and optional
/// whitespace text), meaning it's safe to add indentation.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    let mut has_element_child = false;
    for child in doc.children(id) {
        match &doc.node(child).kind {
            NodeKind::Element { .. } => has_element_child = true,
            NodeKind::Text { content } => {
                if !content.trim().is_empty() {
                    return false;
                }
            }
            NodeKind::CData { .. } => return false,
            _ => {}
        }
    }
    has_element_child
}

fn write_indent(out: &mut String, options: &SerializeOptions, depth: usize) {
    for _ in 0..depth {
        out.push_str(&options.indent_str);
    }
}

fn write_node(
    doc: &Document,
    id: NodeId,
    out: &mut String,
    options: &SerializeOptions,
    depth: usize,
    parent_is_element_only: bool,
) {
    let pretty = options.indent && parent_is_element_only;
    match &doc.node(id).kind {
        NodeKind::Element { name, attributes } => {
            if pretty {
                write_indent(out, options, depth);
            }
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                write_attribute(out, &attr.name, &attr.value);
            }

            if doc.first_child(id).is_none() {
                out.push_str("/>");
            } else {
                out.push('>');
                let element_only = options.indent && is_element_only(doc, id);
                if element_only {
                    out.push('\n');
                }
                for child in doc.children(id) {
                    if element_only {
                        if let NodeKind::Text { content } = &doc.node(child).kind {
                            if content.trim().is_empty() {
                                continue;
                            }
                        }
                    }
                    write_node(doc, child, out, options, depth + 1, element_only);
                }
                if element_only {
                    write_indent(out, options, depth);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            if pretty {
                out.push('\n');
            }
        }
        NodeKind::Attribute(attr) => write_attribute(out, &attr.name, &attr.value),
        NodeKind::Text { content } => write_escaped_text(out, content),
        NodeKind::CData { content } => {
            // `]]>` cannot occur inside a section, so split it across two.
            out.push_str("<![CDATA[");
            out.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        NodeKind::Comment { content } => {
            if pretty {
                write_indent(out, options, depth);
            }
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
            if pretty {
                out.push('\n');
            }
        }
        NodeKind::ProcessingInstruction { target, data } => {
            if pretty {
                write_indent(out, options, depth);
            }
            out.push_str("<?");
            out.push_str(target);
            if let Some(d) = data {
                out.push(' ');
                out.push_str(d);
            }
            out.push_str("?>");
            if pretty {
                out.push('\n');
            }
        }
        NodeKind::DocumentType {
            name,
            system_id,
            public_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            match (public_id, system_id) {
                (Some(pub_id), sys_id) => {
                    out.push_str(" PUBLIC ");
                    write_literal(out, pub_id);
                    out.push(' ');
                    write_literal(out, sys_id.as_deref().unwrap_or(""));
                }
                (None, Some(sys_id)) => {
                    out.push_str(" SYSTEM ");
                    write_literal(out, sys_id);
                }
                (None, None) => {}
            }
            out.push('>');
        }
        NodeKind::DocumentFragment => {
            for child in doc.children(id) {
                write_node(doc, child, out, options, depth, parent_is_element_only);
            }
        }
        // Only reachable through `serialize_node`, which handles it.
        NodeKind::Document => {}
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str("=\"");
    write_escaped_attr(out, value);
    out.push('"');
}

/// Writes a system or public literal. Literals cannot hold references, so
/// a value containing `"` is written in single quotes instead.
fn write_literal(out: &mut String, value: &str) {
    let quote = if value.contains('"') { '\'' } else { '"' };
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}

/// Writes a hexadecimal character reference (`&#xHH;`) for a code point.
fn write_hex_char_ref(out: &mut String, ch: char) {
    let _ = write!(out, "&#x{:X};", ch as u32);
}

/// Escapes text content for XML output.
///
/// - `<`, `>`, `&` are escaped with named entity references
/// - `\r` is encoded as `&#13;` so it survives line-end normalization
/// - `\t` and `\n` are passed through
/// - Other control characters below 0x20 are hex-encoded
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes attribute values for XML output.
///
/// - `<`, `>`, `&`, `"` are escaped with named entity references
/// - `\t` → `&#9;`, `\n` → `&#10;`, `\r` → `&#13;`, so that attribute
///   value normalization leaves them intact
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}
