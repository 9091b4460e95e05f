//! Round trips through read, convert, and render.
//!
//! A document converted to a tree, rendered, and read back must yield the
//! same parsed tree as converting the tree back directly.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

use xmlbridge::convert::{to_parsed, to_target_tree, ConvertOptions};
use xmlbridge::error::Error;
use xmlbridge::parsed::{ParsedObject, ParsedValue};
use xmlbridge::reader::{self, ReadOptions};
use xmlbridge::serial::{serialize, serialize_node, serialize_with_options, SerializeOptions};
use xmlbridge::tree::NodeType;
use xmlbridge::uri::path::{Path, PathOptions};
use xmlbridge::Document;

fn convert(parsed: &ParsedObject) -> Document {
    to_target_tree(parsed, &ConvertOptions::default()).unwrap()
}

fn reread(doc: &Document) -> ParsedObject {
    reader::parse_str(&serialize(doc), &ReadOptions::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Literal round trips
// ---------------------------------------------------------------------------

#[test]
fn test_element_with_attribute_and_text() {
    let parsed = ParsedObject::from_json(&json!({"root": {"@_id": "1", "#text": "hi"}})).unwrap();
    let doc = convert(&parsed);
    let root = doc.root_element().unwrap();
    assert_eq!(serialize_node(&doc, root), "<root id=\"1\">hi</root>");

    let again = Document::parse_str(&serialize(&doc)).unwrap();
    let root = again.root_element().unwrap();
    assert_eq!(again.node_type(root), NodeType::Element);
    assert_eq!(again.node_name(root), Some("root"));
    assert_eq!(again.attribute(root, "id"), Some("1"));
    assert_eq!(again.text_content(root), "hi");
    assert_eq!(reread(&doc), to_parsed(&doc));
}

#[test]
fn test_document_with_every_node_kind() {
    let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                 <!DOCTYPE catalog SYSTEM \"catalog.dtd\">\n\
                 <?xml-stylesheet href=\"style.css\"?>\n\
                 <!-- generated -->\n\
                 <catalog lang=\"en\">\n\
                   <book id=\"b1\" title=\"Tom &amp; Jerry\">\n\
                     <![CDATA[<raw> & text]]>\n\
                     <?page 12?>\n\
                     Text &lt;escaped&gt;\n\
                   </book>\n\
                   <empty/>\n\
                 </catalog>\n";
    let parsed = reader::parse_str(input, &ReadOptions::default()).unwrap();
    let doc = convert(&parsed);
    assert_eq!(to_parsed(&doc), parsed);
    assert_eq!(reread(&doc), parsed);

    let catalog = doc.root_element().unwrap();
    let book = doc.first_child(catalog).and_then(|n| doc.next_sibling(n)).unwrap();
    assert_eq!(doc.attribute(book, "title"), Some("Tom & Jerry"));
}

#[test]
fn test_order_preserving_json_input() {
    let input = json!([
        {"?xml": {"@_version": "1.0"}},
        {"#comment": " header "},
        {"list": {"@_n": "2", "item": ["one", "two"], "#text": "tail"}}
    ]);
    let parsed = ParsedObject::from_json(&input).unwrap();
    let doc = convert(&parsed);
    assert_eq!(
        serialize(&doc),
        "<?xml version=\"1.0\"?>\n<!-- header -->\n<list n=\"2\"><item>one</item><item>two</item>tail</list>\n"
    );
}

#[test]
fn test_repeated_siblings_round_trip_as_entries() {
    let parsed = ParsedObject::from_json(&json!({"r": {"item": ["a", "b"]}})).unwrap();
    let doc = convert(&parsed);
    let root = doc.root_element().unwrap();
    assert_eq!(serialize_node(&doc, root), "<r><item>a</item><item>b</item></r>");

    let expected = ParsedObject::new().with(
        "r",
        ParsedObject::new().with("item", "a").with("item", "b"),
    );
    assert_eq!(reread(&doc), expected);
}

#[test]
fn test_indented_output_reads_back_without_blanks() {
    let parsed = ParsedObject::from_json(&json!({"a": {"b": {"c": "x"}, "d": ""}})).unwrap();
    let doc = convert(&parsed);
    let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
    assert_eq!(xml, "<a>\n  <b>\n    <c>x</c>\n  </b>\n  <d/>\n</a>\n");
    let options = ReadOptions::default().no_blanks(true);
    assert_eq!(reader::parse_str(&xml, &options).unwrap(), parsed);
}

#[test]
fn test_mixed_content_survives_json() {
    let parsed = reader::parse_str("<r>a<b/>c</r>", &ReadOptions::default()).unwrap();
    let json = parsed.to_json();
    assert_eq!(
        json,
        json!({"r": {"#ordered": [{"#text": "a"}, {"b": ""}, {"#text": "c"}]}})
    );
    let back = ParsedObject::from_json(&json).unwrap();
    assert_eq!(back, parsed);
    assert_eq!(serialize(&convert(&back)), "<r>a<b/>c</r>\n");
}

#[test]
fn test_parse_bytes_latin1() {
    let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>caf\xE9</r>";
    let doc = Document::parse_bytes(bytes).unwrap();
    assert_eq!(doc.text_content(doc.root_element().unwrap()), "caf\u{E9}");
    assert_eq!(doc.encoding.as_deref(), Some("ISO-8859-1"));
}

#[test]
fn test_pipeline_errors_keep_their_kind() {
    assert!(matches!(Document::parse_str("<a></b>"), Err(Error::Parse(_))));
    let parsed = ParsedObject::from_json(&json!({"123bad": ""})).unwrap();
    let err = to_target_tree(&parsed, &ConvertOptions::default()).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("123bad"));
}

#[test]
fn test_path_absolute_policy() {
    let strict = PathOptions::default().allow_absolute(false);
    assert!(Path::new(["", "a"], &strict).is_err());

    let lenient = PathOptions::default().allow_absolute(true);
    let path = Path::new(["", "a"], &lenient).unwrap();
    assert_eq!(path.to_string(), "/a");
}

// ---------------------------------------------------------------------------
// Generated documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Item {
    Element(String, Vec<String>, Vec<Item>),
    Text(String),
    CData(String),
    Comment(String),
    Pi(String, String),
}

// Names never start with `x`, so no PI target is the reserved `xml`.
fn name_strategy() -> BoxedStrategy<String> {
    "[a-wyz][a-z0-9._-]{0,5}".boxed()
}

fn item_strategy() -> impl Strategy<Value = Item> {
    let leaf = prop_oneof![
        "[a-zA-Z0-9 <>&\"'\n\t]{1,12}".prop_map(Item::Text),
        "[a-z <>&]{0,8}".prop_map(Item::CData),
        "[a-z <>&]{0,8}".prop_map(Item::Comment),
        (name_strategy(), "([a-z=\"][a-z =\"]{0,8})?").prop_map(|(t, d)| Item::Pi(t, d)),
        (name_strategy(), proptest::collection::btree_set(name_strategy(), 0..3))
            .prop_map(|(n, attrs)| Item::Element(n, attrs.into_iter().collect(), Vec::new())),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        (
            name_strategy(),
            proptest::collection::btree_set(name_strategy(), 0..3),
            proptest::collection::vec(inner, 0..6),
        )
            .prop_map(|(n, attrs, children)| Item::Element(n, attrs.into_iter().collect(), children))
    })
}

fn push_item(item: &Item, out: &mut ParsedObject, last_was_text: &mut bool) {
    let is_text = matches!(item, Item::Text(_));
    // Adjacent text nodes merge when read back.
    if is_text && *last_was_text {
        return;
    }
    *last_was_text = is_text;
    match item {
        Item::Element(name, attrs, children) => {
            let mut content = ParsedObject::new();
            for attr in attrs {
                content.push(format!("@_{attr}"), format!("{attr} \"v\" & <w>"));
            }
            let mut child_text = false;
            for child in children {
                push_item(child, &mut content, &mut child_text);
            }
            out.push(name.as_str(), ParsedValue::Object(content));
        }
        Item::Text(text) => out.push("#text", text.as_str()),
        Item::CData(text) => out.push("#cdata", text.as_str()),
        Item::Comment(text) => out.push("#comment", text.as_str()),
        Item::Pi(target, data) => out.push(format!("?{target}"), data.as_str()),
    }
}

fn build_document(root: &str, children: &[Item], with_decl: bool) -> ParsedObject {
    let mut parsed = ParsedObject::new();
    if with_decl {
        parsed.push("?xml", ParsedObject::new().with("@_version", "1.0"));
    }
    parsed.push("!doc", "");
    let mut content = ParsedObject::new();
    let mut last_was_text = false;
    for child in children {
        push_item(child, &mut content, &mut last_was_text);
    }
    parsed.push(root, ParsedValue::Object(content));
    parsed
}

proptest! {
    #[test]
    fn json_form_reads_back_equal(
        root in name_strategy(),
        children in proptest::collection::vec(item_strategy(), 0..6),
        with_decl in any::<bool>(),
    ) {
        let parsed = build_document(&root, &children, with_decl);
        let json = parsed.to_json();
        let back = ParsedObject::from_json(&json).unwrap();
        prop_assert_eq!(back, parsed, "{}", json);
    }

    #[test]
    fn rendered_trees_read_back_equal(
        root in name_strategy(),
        children in proptest::collection::vec(item_strategy(), 0..6),
        with_decl in any::<bool>(),
    ) {
        let parsed = build_document(&root, &children, with_decl);
        let doc = convert(&parsed);
        let xml = serialize(&doc);
        let back = reader::parse_str(&xml, &ReadOptions::default()).unwrap();
        prop_assert_eq!(back, to_parsed(&doc), "{}", xml);
    }
}
