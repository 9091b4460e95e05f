//! Conversion between parsed trees and target trees.
//!
//! [`to_target_tree`] walks a [`ParsedObject`] in key order and builds a
//! [`Document`]; [`build_into`] does the same into any [`TreeSink`].
//! [`to_parsed`] goes the other way, producing the shape the reader emits,
//! so two trees can be compared through their parsed form.
//!
//! Conversion is strict: an unknown key, a value of the wrong shape, or a
//! node in a position it may not occupy aborts the whole document with a
//! [`DecodeError`]. So does content that has no XML spelling reading back
//! as the same tree: a comment containing `--`, CDATA containing `]]>`,
//! PI data containing `?>`, or a character outside the XML `Char` range.

pub mod property;

use crate::error::DecodeError;
use crate::parsed::{ParsedObject, ParsedValue};
use crate::tree::{Document, NodeId, NodeKind, NodeType, TreeSink};
use crate::util::chars::is_xml_char;

use property::{classify, escape_attribute, PropertyType};

/// Default nesting limit for [`ConvertOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling tree conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Maximum element nesting depth. Deeper content is a `DecodeError`.
    /// Defaults to 256.
    pub max_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConvertOptions {
    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Converts a parsed document into a new [`Document`].
///
/// # Errors
///
/// Returns `DecodeError` for an unknown key, a misplaced declaration or
/// attribute, a value of the wrong shape, or nesting deeper than
/// `options.max_depth`.
///
/// # Examples
///
/// ```
/// use xmlbridge::convert::{to_target_tree, ConvertOptions};
/// use xmlbridge::parsed::ParsedObject;
/// use xmlbridge::serial::serialize_node;
///
/// let parsed = ParsedObject::new().with(
///     "root",
///     ParsedObject::new().with("@_id", "1").with("#text", "hi"),
/// );
/// let doc = to_target_tree(&parsed, &ConvertOptions::default()).unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(serialize_node(&doc, root), r#"<root id="1">hi</root>"#);
/// ```
pub fn to_target_tree(
    parsed: &ParsedObject,
    options: &ConvertOptions,
) -> Result<Document, DecodeError> {
    let mut doc = Document::new();
    build_into(&mut doc, parsed, options)?;
    Ok(doc)
}

/// Converts a parsed document into the document node of `sink`.
///
/// # Errors
///
/// See [`to_target_tree`].
pub fn build_into<S: TreeSink>(
    sink: &mut S,
    parsed: &ParsedObject,
    options: &ConvertOptions,
) -> Result<(), DecodeError> {
    tracing::debug!(entries = parsed.len(), "converting parsed document");
    let mut converter = Converter {
        sink,
        options,
        depth: 0,
    };
    let document = converter.sink.document();
    converter.fill(document, parsed)?;
    tracing::debug!("conversion finished");
    Ok(())
}

/// Where a converted node is being inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Document,
    Element,
    Fragment,
}

struct Converter<'a, S: TreeSink> {
    sink: &'a mut S,
    options: &'a ConvertOptions,
    depth: usize,
}

impl<S: TreeSink> Converter<'_, S> {
    /// Converts every entry of `object` and inserts the results into
    /// `parent`.
    ///
    /// Adjacent character data is merged into one text node, the way the
    /// reader merges it.
    fn fill(&mut self, parent: S::Handle, object: &ParsedObject) -> Result<(), DecodeError> {
        let position = match self.sink.node_type(parent) {
            NodeType::Document => Parent::Document,
            NodeType::DocumentFragment => Parent::Fragment,
            _ => Parent::Element,
        };
        let mut text = String::new();
        let mut has_root = false;
        for (key, value) in object.iter() {
            let classified = classify(key)?;
            tracing::trace!(key, kind = classified.kind.name(), "classified property");
            match classified.kind {
                PropertyType::ProcessInstruction if classified.tag == "xml" => {
                    if position != Parent::Document {
                        return Err(DecodeError::for_key(
                            "XML declaration allowed only at document level",
                            key,
                        ));
                    }
                    self.xml_declaration(key, value)?;
                    continue;
                }
                PropertyType::Attribute => {
                    if position == Parent::Document {
                        return Err(DecodeError::for_key(
                            "attribute not allowed at document level",
                            key,
                        ));
                    }
                    self.attribute(parent, classified.tag, key, value)?;
                    continue;
                }
                PropertyType::TextNode if position == Parent::Document => {
                    return Err(DecodeError::for_key(
                        "character data not allowed at document level",
                        key,
                    ));
                }
                PropertyType::TextNode if classified.tag == "text" => {
                    push_text(&mut text, key, value)?;
                    continue;
                }
                PropertyType::Element if position == Parent::Document => {
                    let count = match value {
                        ParsedValue::List(items) => items.len(),
                        _ => 1,
                    };
                    if count > 1 || (has_root && count > 0) {
                        return Err(DecodeError::for_key(
                            "document already has a root element",
                            key,
                        ));
                    }
                    has_root |= count > 0;
                }
                _ => {}
            }
            self.flush_text(parent, &mut text);
            let node = self.convert(classified.kind, classified.tag, key, value)?;
            self.insert(parent, position, key, node)?;
        }
        self.flush_text(parent, &mut text);
        Ok(())
    }

    fn flush_text(&mut self, parent: S::Handle, text: &mut String) {
        if !text.is_empty() {
            let node = self.sink.create_text(text);
            self.sink.append_child(parent, node);
            text.clear();
        }
    }

    fn attribute(
        &mut self,
        element: S::Handle,
        name: &str,
        key: &str,
        value: &ParsedValue,
    ) -> Result<(), DecodeError> {
        if let ParsedValue::List(_) = value {
            return Err(DecodeError::for_key("attribute cannot be repeated", key));
        }
        let text = expect_text(key, value, "attribute value")?;
        check_chars(key, text, "attribute value")?;
        self.sink.set_attribute_value(element, name, text);
        Ok(())
    }

    fn insert(
        &mut self,
        parent: S::Handle,
        position: Parent,
        key: &str,
        node: S::Handle,
    ) -> Result<(), DecodeError> {
        match (position, self.sink.node_type(node)) {
            (Parent::Document, NodeType::DocumentType) => self.sink.set_document_type(node),
            (Parent::Element | Parent::Fragment, NodeType::Document | NodeType::DocumentType) => {
                return Err(DecodeError::for_key(
                    "declaration not allowed inside an element",
                    key,
                ));
            }
            (_, NodeType::DocumentFragment) => self.sink.splice_fragment(parent, node),
            _ => self.sink.append_child(parent, node),
        }
        Ok(())
    }

    /// Converts one entry into a node. A list value becomes a fragment of
    /// repeated siblings sharing the key, except for processing
    /// instructions, whose data joins the items.
    fn convert(
        &mut self,
        kind: PropertyType,
        tag: &str,
        key: &str,
        value: &ParsedValue,
    ) -> Result<S::Handle, DecodeError> {
        if let ParsedValue::List(items) = value {
            match kind {
                PropertyType::Attribute => {
                    return Err(DecodeError::for_key("attribute cannot be repeated", key));
                }
                PropertyType::DocType => {
                    return Err(DecodeError::for_key(
                        "document type cannot be repeated",
                        key,
                    ));
                }
                // PI data joins list items instead.
                PropertyType::ProcessInstruction => {}
                _ => {
                    let fragment = self.sink.create_fragment();
                    for item in items {
                        let node = self.convert(kind, tag, key, item)?;
                        self.insert(fragment, Parent::Fragment, key, node)?;
                    }
                    return Ok(fragment);
                }
            }
        }
        match kind {
            PropertyType::Attribute => Err(DecodeError::for_key(
                "attribute not allowed outside an element",
                key,
            )),
            PropertyType::Element => self.element(tag, key, value),
            PropertyType::TextNode => {
                let text = expect_text(key, value, "text content")?;
                check_chars(key, text, "text content")?;
                if tag == "text" {
                    Ok(self.sink.create_text(text))
                } else {
                    check_markup(key, text, "CDATA section", &["]]>", "\r"])?;
                    Ok(self.sink.create_cdata(text))
                }
            }
            PropertyType::Comment => {
                let text = expect_text(key, value, "comment")?;
                check_chars(key, text, "comment")?;
                check_markup(key, text, "comment", &["--", "\r"])?;
                if text.ends_with('-') {
                    return Err(DecodeError::for_key("comment must not end with '-'", key));
                }
                Ok(self.sink.create_comment(text))
            }
            PropertyType::ProcessInstruction => {
                if tag.eq_ignore_ascii_case("xml") {
                    return Err(DecodeError::for_key(
                        "processing instruction target 'xml' is reserved",
                        key,
                    ));
                }
                let data = stringify_instruction(key, value)?;
                check_chars(key, &data, "processing instruction")?;
                check_markup(key, &data, "processing instruction", &["?>", "\r"])?;
                if data.starts_with([' ', '\t', '\n']) {
                    return Err(DecodeError::for_key(
                        "processing instruction data must not start with whitespace",
                        key,
                    ));
                }
                Ok(self.sink.create_processing_instruction(tag, &data))
            }
            PropertyType::DocType => self.doc_type(tag, key, value),
        }
    }

    fn element(
        &mut self,
        tag: &str,
        key: &str,
        value: &ParsedValue,
    ) -> Result<S::Handle, DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(DecodeError::for_key(
                format!("maximum nesting depth of {} exceeded", self.options.max_depth),
                key,
            ));
        }
        let element = self.sink.create_element(tag);
        match value {
            ParsedValue::Text(text) if text.is_empty() => {}
            ParsedValue::Text(text) => {
                check_chars(key, text, "text content")?;
                let node = self.sink.create_text(text);
                self.sink.append_child(element, node);
            }
            ParsedValue::Object(content) => {
                self.depth += 1;
                let result = self.fill(element, content);
                self.depth -= 1;
                result?;
            }
            ParsedValue::List(_) => {
                return Err(DecodeError::for_key("nested list in element", key));
            }
        }
        Ok(element)
    }

    fn doc_type(
        &mut self,
        tag: &str,
        key: &str,
        value: &ParsedValue,
    ) -> Result<S::Handle, DecodeError> {
        let (public_id, system_id) = match value {
            ParsedValue::Text(_) => (None, None),
            ParsedValue::Object(ids) => {
                let mut public_id = None;
                let mut system_id = None;
                for (id_key, id_value) in ids.iter() {
                    let slot = match id_key {
                        "@_public" => &mut public_id,
                        "@_system" => &mut system_id,
                        _ => {
                            return Err(DecodeError::for_key(
                                "document type supports only @_public and @_system",
                                id_key,
                            ));
                        }
                    };
                    let id = expect_text(id_key, id_value, "identifier")?;
                    check_chars(id_key, id, "identifier")?;
                    if id.contains('"') && id.contains('\'') {
                        return Err(DecodeError::for_key(
                            "identifier cannot contain both quote characters",
                            id_key,
                        ));
                    }
                    *slot = Some(id);
                }
                (public_id, system_id)
            }
            ParsedValue::List(_) => {
                return Err(DecodeError::for_key(
                    "document type cannot be repeated",
                    key,
                ));
            }
        };
        Ok(self
            .sink
            .create_document_type(tag, public_id, system_id))
    }

    fn xml_declaration(&mut self, key: &str, value: &ParsedValue) -> Result<(), DecodeError> {
        let mut version = None;
        let mut encoding = None;
        let mut standalone = None;
        match value {
            ParsedValue::Text(text) if text.trim().is_empty() => {}
            ParsedValue::Object(fields) => {
                for (field, field_value) in fields.iter() {
                    let text = expect_text(field, field_value, "declaration field")?;
                    match field {
                        "@_version" => version = Some(text),
                        "@_encoding" => encoding = Some(text),
                        "@_standalone" => {
                            standalone = Some(match text {
                                "yes" => true,
                                "no" => false,
                                _ => {
                                    return Err(DecodeError::for_key(
                                        "standalone must be \"yes\" or \"no\"",
                                        field,
                                    ));
                                }
                            });
                        }
                        _ => {
                            return Err(DecodeError::for_key(
                                "unknown XML declaration field",
                                field,
                            ));
                        }
                    }
                }
            }
            _ => {
                return Err(DecodeError::for_key(
                    "XML declaration must be an object of @_version, @_encoding, @_standalone",
                    key,
                ));
            }
        }
        self.sink.set_xml_declaration(version, encoding, standalone);
        Ok(())
    }
}

fn expect_text<'v>(key: &str, value: &'v ParsedValue, what: &str) -> Result<&'v str, DecodeError> {
    value
        .as_text()
        .ok_or_else(|| DecodeError::for_key(format!("{what} must be text"), key))
}

/// Appends character data, joining list items, to the pending text run.
fn push_text(run: &mut String, key: &str, value: &ParsedValue) -> Result<(), DecodeError> {
    match value {
        ParsedValue::List(items) => {
            for item in items {
                push_text(run, key, item)?;
            }
        }
        _ => {
            let text = expect_text(key, value, "text content")?;
            check_chars(key, text, "text content")?;
            run.push_str(text);
        }
    }
    Ok(())
}

/// Rejects characters outside the XML `Char` production.
fn check_chars(key: &str, text: &str, what: &str) -> Result<(), DecodeError> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(DecodeError::for_key(
            format!("{what} contains U+{:04X}, which XML cannot represent", c as u32),
            key,
        )),
        None => Ok(()),
    }
}

/// Rejects content that would end its markup early or not read back as
/// written. `\r` in unescaped markup reads back as `\n`.
fn check_markup(key: &str, text: &str, what: &str, forbidden: &[&str]) -> Result<(), DecodeError> {
    match forbidden.iter().find(|f| text.contains(*f)) {
        Some(f) => Err(DecodeError::for_key(
            format!("{what} must not contain {f:?}"),
            key,
        )),
        None => Ok(()),
    }
}

/// Renders structured processing-instruction content as PI data.
///
/// Text is used as is, lists are joined by a space, and objects render
/// attribute keys as `name="escaped"` pairs and text keys as their text.
fn stringify_instruction(key: &str, value: &ParsedValue) -> Result<String, DecodeError> {
    match value {
        ParsedValue::Text(text) => Ok(text.clone()),
        ParsedValue::List(items) => Ok(items
            .iter()
            .map(|item| stringify_instruction(key, item))
            .collect::<Result<Vec<_>, _>>()?
            .join(" ")),
        ParsedValue::Object(object) => {
            let mut parts = Vec::with_capacity(object.len());
            for (inner_key, inner_value) in object.iter() {
                let classified = classify(inner_key)?;
                let rendered = stringify_instruction(inner_key, inner_value)?;
                match classified.kind {
                    PropertyType::Attribute => parts.push(format!(
                        "{}=\"{}\"",
                        classified.tag,
                        escape_attribute(&rendered)
                    )),
                    PropertyType::TextNode => parts.push(rendered),
                    _ => {
                        return Err(DecodeError::for_key(
                            format!(
                                "{} not allowed in a processing instruction",
                                classified.kind
                            ),
                            inner_key,
                        ));
                    }
                }
            }
            Ok(parts.join(" "))
        }
    }
}

// -------------------------------------------------------------------------
// Target tree -> parsed tree
// -------------------------------------------------------------------------

/// Converts a document back into its parsed form.
///
/// Element content is collapsed the way the reader collapses it: an element
/// with no attributes and no children becomes empty text, and one whose
/// only child is a single text node becomes that text.
#[must_use]
pub fn to_parsed(doc: &Document) -> ParsedObject {
    let mut object = ParsedObject::new();
    if doc.version.is_some() || doc.encoding.is_some() || doc.standalone.is_some() {
        let mut decl = ParsedObject::new();
        if let Some(version) = &doc.version {
            decl.push("@_version", version.as_str());
        }
        if let Some(encoding) = &doc.encoding {
            decl.push("@_encoding", encoding.as_str());
        }
        if let Some(standalone) = doc.standalone {
            decl.push("@_standalone", if standalone { "yes" } else { "no" });
        }
        object.push("?xml", decl);
    }
    for child in doc.children(doc.root()) {
        push_node(doc, child, &mut object);
    }
    object
}

fn push_node(doc: &Document, id: NodeId, out: &mut ParsedObject) {
    match &doc.node(id).kind {
        NodeKind::Element { name, attributes } => {
            let mut content = ParsedObject::new();
            for attr in attributes {
                content.push(format!("@_{}", attr.name), attr.value.as_str());
            }
            for child in doc.children(id) {
                push_node(doc, child, &mut content);
            }
            out.push(name.as_str(), collapse_element(content));
        }
        NodeKind::Text { content } => out.push("#text", content.as_str()),
        NodeKind::CData { content } => out.push("#cdata", content.as_str()),
        NodeKind::Comment { content } => out.push("#comment", content.as_str()),
        NodeKind::ProcessingInstruction { target, data } => {
            out.push(format!("?{target}"), data.as_deref().unwrap_or(""));
        }
        NodeKind::DocumentType {
            name,
            public_id,
            system_id,
        } => {
            let value = if public_id.is_none() && system_id.is_none() {
                ParsedValue::Text(String::new())
            } else {
                let mut ids = ParsedObject::new();
                if let Some(public_id) = public_id {
                    ids.push("@_public", public_id.as_str());
                }
                if let Some(system_id) = system_id {
                    ids.push("@_system", system_id.as_str());
                }
                ParsedValue::Object(ids)
            };
            out.push(format!("!{name}"), value);
        }
        NodeKind::DocumentFragment => {
            for child in doc.children(id) {
                push_node(doc, child, out);
            }
        }
        NodeKind::Document | NodeKind::Attribute(_) => {}
    }
}

/// Collapses element content to the reader's compact forms.
pub(crate) fn collapse_element(content: ParsedObject) -> ParsedValue {
    if content.is_empty() {
        return ParsedValue::Text(String::new());
    }
    if content.len() == 1 {
        if let Some(ParsedValue::Text(text)) = content.get("#text") {
            if !text.is_empty() {
                return ParsedValue::Text(text.clone());
            }
        }
    }
    ParsedValue::Object(content)
}
