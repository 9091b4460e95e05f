//! Security-focused tests for xmlbridge.
//!
//! These tests verify that the reader and the converter reject malicious
//! or pathological inputs that could cause denial of service (`DoS`) via
//! excessive recursion, or leak data through entity expansion.

#![allow(clippy::unwrap_used)]

use std::fmt::Write;

use xmlbridge::convert::{to_target_tree, ConvertOptions};
use xmlbridge::parsed::{ParsedObject, ParsedValue};
use xmlbridge::reader::{parse_str, ReadOptions};
use xmlbridge::Document;

fn nested_xml(depth: usize) -> String {
    let open: String = (0..depth).map(|_| "<a>").collect();
    let close: String = (0..depth).map(|_| "</a>").collect();
    format!("{open}{close}")
}

fn nested_parsed(depth: usize) -> ParsedObject {
    let mut value = ParsedValue::Text(String::new());
    for _ in 0..depth {
        value = ParsedValue::Object(ParsedObject::new().with("a", value));
    }
    match value {
        ParsedValue::Object(object) => object,
        _ => ParsedObject::new(),
    }
}

// ---------------------------------------------------------------------------
// Reader depth limit
// ---------------------------------------------------------------------------

#[test]
fn test_deeply_nested_elements_rejected() {
    // Run in a thread with a larger stack to avoid stack overflow in debug mode.
    let result = std::thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(|| parse_str(&nested_xml(300), &ReadOptions::default()))
        .unwrap()
        .join()
        .unwrap();
    let err = result.unwrap_err();
    assert!(
        err.message.contains("depth"),
        "error should mention depth: {}",
        err.message
    );
}

#[test]
fn test_depth_limit_exact_boundary() {
    let opts = ReadOptions::default().max_depth(3);
    assert!(
        parse_str(&nested_xml(3), &opts).is_ok(),
        "depth exactly at limit should succeed"
    );
    assert!(
        parse_str(&nested_xml(4), &opts).is_err(),
        "depth one over limit should fail"
    );
}

// ---------------------------------------------------------------------------
// Converter depth limit
// ---------------------------------------------------------------------------

#[test]
fn test_converter_depth_limit() {
    let opts = ConvertOptions::default().max_depth(3);
    assert!(to_target_tree(&nested_parsed(3), &opts).is_ok());

    let err = to_target_tree(&nested_parsed(4), &opts).unwrap_err();
    assert!(
        err.message.contains("depth"),
        "error should mention depth: {}",
        err.message
    );
    assert_eq!(err.key.as_deref(), Some("a"));
}

#[test]
fn test_converter_rejects_deep_json_by_default() {
    let result = std::thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(|| to_target_tree(&nested_parsed(300), &ConvertOptions::default()))
        .unwrap()
        .join()
        .unwrap();
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[test]
fn test_declared_entities_are_not_expanded() {
    // Billion laughs: declarations in the internal subset are skipped, so
    // the reference is unknown rather than expanded.
    let xml = "<!DOCTYPE r [\n\
               <!ENTITY lol \"lol\">\n\
               <!ENTITY lol2 \"&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;\">\n\
               ]>\n<r>&lol2;</r>";
    let err = parse_str(xml, &ReadOptions::default()).unwrap_err();
    assert!(err.message.contains("unknown entity"), "{}", err.message);
}

#[test]
fn test_external_entities_are_never_loaded() {
    let xml = "<!DOCTYPE r [<!ENTITY x SYSTEM \"file:///etc/passwd\">]><r>&x;</r>";
    assert!(parse_str(xml, &ReadOptions::default()).is_err());
}

// ---------------------------------------------------------------------------
// Name length limit
// ---------------------------------------------------------------------------

#[test]
fn test_huge_element_name_rejected() {
    let name = "a".repeat(100_000);
    let xml = format!("<{name}/>");
    let err = parse_str(&xml, &ReadOptions::default()).unwrap_err();
    assert!(
        err.message.contains("name length"),
        "error should mention name length: {}",
        err.message
    );
}

// ---------------------------------------------------------------------------
// Default limits are permissive enough for normal documents
// ---------------------------------------------------------------------------

#[test]
fn test_default_limits_allow_normal_documents() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
    <catalog>
        <book id="1">
            <title>Rust Programming</title>
            <author>Jane &amp; John Doe</author>
            <price>29.99</price>
            <description><![CDATA[A great book about <Rust>]]></description>
        </book>
        <book id="2">
            <title>XML &amp; &lt;HTML&gt; Parsing</title>
            <author>Alice O&apos;Brien</author>
            <price>19.99</price>
            <!-- A comment about this book -->
            <?note review-pending?>
        </book>
    </catalog>"#;

    assert!(
        Document::parse_str(xml).is_ok(),
        "normal document should parse with default limits"
    );
}

#[test]
fn test_default_limits_allow_moderate_nesting() {
    // 100 levels of nesting should be fine (default limit is 256)
    let open = (0..100).fold(String::new(), |mut s, i| {
        write!(s, "<e{i}>").unwrap();
        s
    });
    let close = (0..100).rev().fold(String::new(), |mut s, i| {
        write!(s, "</e{i}>").unwrap();
        s
    });
    let xml = format!("{open}{close}");

    assert!(
        Document::parse_str(&xml).is_ok(),
        "100 levels of nesting should work with default limits"
    );
}

#[test]
fn test_default_limits_allow_many_attributes() {
    let attrs = (0..100).fold(String::new(), |mut s, i| {
        write!(s, " attr{i}=\"value{i}\"").unwrap();
        s
    });
    let xml = format!("<root{attrs}/>");

    let doc = Document::parse_str(&xml).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.attributes(root).len(), 100);
    assert_eq!(doc.attribute(root, "attr99"), Some("value99"));
}
