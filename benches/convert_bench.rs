#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use xmlbridge::convert::{to_parsed, to_target_tree, ConvertOptions};
use xmlbridge::reader::{self, ReadOptions};
use xmlbridge::serial::serialize;
use xmlbridge::uri::valid_uri;
use xmlbridge::util::{is_valid_qname, is_valid_xml_name};

// ---------------------------------------------------------------------------
// Input generators
// ---------------------------------------------------------------------------

/// Generates a catalog document with approximately 500 elements.
fn make_catalog_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<catalog>\n");
    for i in 0..100 {
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\"><title>Title {i}</title>\
             <author>Author {i}</author><!-- note {i} -->\
             <price>{}.99</price></book>",
            10 + i
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

const NAMES: &[&str] = &[
    "root",
    "svg:rect",
    "xml:lang",
    "_private",
    "\u{E9}l\u{E9}ment",
    "1bad",
    "a:b:c",
    "data-value.2",
];

const URIS: &[&str] = &[
    "http://example.com/path?q=1#frag",
    "https://user@[2001:db8::1]:8443/a/b",
    "urn:isbn:0451450523",
    "file:///etc/hosts",
    "mailto:someone@example.org",
    "not a uri",
];

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_name_validation(c: &mut Criterion) {
    c.bench_function("name_validation", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(is_valid_xml_name(black_box(name)));
                black_box(is_valid_qname(black_box(name)));
            }
        });
    });
}

fn bench_uri_validation(c: &mut Criterion) {
    c.bench_function("uri_validation", |b| {
        b.iter(|| {
            for uri in URIS {
                black_box(valid_uri(black_box(*uri)));
            }
        });
    });
}

fn bench_read(c: &mut Criterion) {
    let xml = make_catalog_xml();
    c.bench_function("read_catalog", |b| {
        b.iter(|| reader::parse_str(black_box(&xml), &ReadOptions::default()));
    });
}

fn bench_convert(c: &mut Criterion) {
    let xml = make_catalog_xml();
    let parsed = reader::parse_str(&xml, &ReadOptions::default()).expect("parse failed");
    c.bench_function("convert_catalog", |b| {
        b.iter(|| to_target_tree(black_box(&parsed), &ConvertOptions::default()));
    });
}

fn bench_roundtrip(c: &mut Criterion) {
    let xml = make_catalog_xml();
    c.bench_function("roundtrip_catalog", |b| {
        b.iter(|| {
            let parsed =
                reader::parse_str(black_box(&xml), &ReadOptions::default()).expect("parse failed");
            let doc =
                to_target_tree(&parsed, &ConvertOptions::default()).expect("convert failed");
            black_box(to_parsed(&doc));
            serialize(&doc)
        });
    });
}

criterion_group!(validation, bench_name_validation, bench_uri_validation);

criterion_group!(conversion, bench_read, bench_convert, bench_roundtrip);

criterion_main!(validation, conversion);
