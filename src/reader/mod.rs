//! XML text reader producing the order-preserving parsed tree.
//!
//! The reader is a recursive descent parser over [`ParserInput`] that emits
//! a [`ParsedObject`] with the structural key taxonomy the converter
//! consumes:
//!
//! | Markup | Key | Value |
//! |---|---|---|
//! | `<?xml version="1.0"?>` | `?xml` | object of `@_version`, `@_encoding`, `@_standalone` |
//! | `<!DOCTYPE r PUBLIC "p" "s">` | `!r` | `""`, or object of `@_public`, `@_system` |
//! | `<e a="1">` | `e`, `@_a` | element content / attribute value |
//! | text and references | `#text` | decoded text |
//! | `<![CDATA[..]]>` | `#cdata` | section content |
//! | `<!--..-->` | `#comment` | comment content |
//! | `<?t data?>` | `?t` | PI data (`""` when absent) |
//!
//! Element content is collapsed exactly as [`convert::to_parsed`] collapses
//! it: an empty element reads as `""` and an element whose only content is
//! text reads as that text. Reading a document and converting the target
//! tree back therefore yield equal parsed trees.
//!
//! Only the predefined entities and character references are expanded.
//! An internal DTD subset is skipped.
//!
//! [`convert::to_parsed`]: crate::convert::to_parsed
//!
//! # Examples
//!
//! ```
//! use xmlbridge::parsed::ParsedValue;
//! use xmlbridge::reader::{parse_str, ReadOptions};
//!
//! let parsed = parse_str("<root id=\"1\">hi</root>", &ReadOptions::default()).unwrap();
//! let root = parsed.get("root").and_then(ParsedValue::as_object).unwrap();
//! assert_eq!(root.get("@_id").and_then(ParsedValue::as_text), Some("1"));
//! assert_eq!(root.get("#text").and_then(ParsedValue::as_text), Some("hi"));
//! ```

mod encoding;
mod input;

use crate::convert::collapse_element;
use crate::error::ParseError;
use crate::parsed::{ParsedObject, ParsedValue};

use input::{
    parse_cdata_content, parse_comment_content, parse_pi_content, parse_xml_decl, ParserInput,
    XmlDeclaration,
};

/// Default maximum element nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum element nesting depth (default: 256).
    pub max_depth: usize,
    /// If true, drop whitespace-only text runs inside elements.
    pub no_blanks: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            no_blanks: false,
        }
    }
}

impl ReadOptions {
    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enables or disables dropping whitespace-only text.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }
}

/// Reads an XML document from a string.
///
/// A leading byte order mark is ignored.
///
/// # Errors
///
/// Returns `ParseError` with the location of the first well-formedness
/// violation: malformed markup, a mismatched end tag, a duplicate
/// attribute, content outside the single root element, an unknown entity,
/// or nesting deeper than `options.max_depth`.
pub fn parse_str(input: &str, options: &ReadOptions) -> Result<ParsedObject, ParseError> {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    tracing::debug!(bytes = input.len(), "reading XML document");
    let mut reader = Reader {
        input: ParserInput::new(input),
        options,
        depth: 0,
    };
    let parsed = reader.parse_document()?;
    tracing::debug!(entries = parsed.len(), "read XML document");
    Ok(parsed)
}

/// Reads an XML document from raw bytes, detecting its encoding.
///
/// UTF-8 and UTF-16 are recognized by byte order mark; any other encoding
/// known to `encoding_rs` must be named by the XML declaration.
///
/// # Errors
///
/// Returns `ParseError` if the bytes cannot be decoded, or for any error
/// [`parse_str`] reports.
pub fn parse_bytes(input: &[u8], options: &ReadOptions) -> Result<ParsedObject, ParseError> {
    let text = encoding::decode_to_utf8(input)?;
    parse_str(&text, options)
}

struct Reader<'a> {
    input: ParserInput<'a>,
    options: &'a ReadOptions,
    depth: usize,
}

impl Reader<'_> {
    fn parse_document(&mut self) -> Result<ParsedObject, ParseError> {
        let mut out = ParsedObject::new();

        if self.at_xml_decl() {
            let decl = parse_xml_decl(&mut self.input)?;
            out.push("?xml", declaration_object(decl));
        }

        let mut seen_doctype = false;
        let mut seen_root = false;
        loop {
            self.input.skip_whitespace();
            if self.input.at_end() {
                break;
            }
            if self.input.looking_at(b"<!--") {
                out.push("#comment", parse_comment_content(&mut self.input)?);
            } else if self.input.looking_at(b"<?") {
                let (target, data) = parse_pi_content(&mut self.input)?;
                out.push(format!("?{target}"), data);
            } else if self.input.looking_at(b"<!DOCTYPE") {
                if seen_doctype || seen_root {
                    return Err(self.input.fatal("misplaced document type declaration"));
                }
                self.parse_doctype(&mut out)?;
                seen_doctype = true;
            } else if self.input.looking_at(b"<") && !self.input.looking_at(b"</") {
                if seen_root {
                    return Err(self.input.fatal("extra content after the root element"));
                }
                self.parse_element(&mut out)?;
                seen_root = true;
            } else {
                return Err(self.input.fatal("content outside the root element"));
            }
        }

        if !seen_root {
            return Err(self.input.fatal("missing root element"));
        }
        Ok(out)
    }

    /// `<?xml` followed by whitespace; `<?xml-stylesheet` is an ordinary PI.
    fn at_xml_decl(&self) -> bool {
        self.input.looking_at(b"<?xml")
            && matches!(self.input.peek_at(5), Some(b' ' | b'\t' | b'\n' | b'\r'))
    }

    fn parse_doctype(&mut self, out: &mut ParsedObject) -> Result<(), ParseError> {
        self.input.expect_str(b"<!DOCTYPE")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();

        let mut ids = ParsedObject::new();
        if self.input.looking_at(b"SYSTEM") {
            self.input.expect_str(b"SYSTEM")?;
            self.input.skip_whitespace_required()?;
            ids.push("@_system", self.input.parse_quoted_value()?);
            self.input.skip_whitespace();
        } else if self.input.looking_at(b"PUBLIC") {
            self.input.expect_str(b"PUBLIC")?;
            self.input.skip_whitespace_required()?;
            ids.push("@_public", self.input.parse_quoted_value()?);
            self.input.skip_whitespace_required()?;
            ids.push("@_system", self.input.parse_quoted_value()?);
            self.input.skip_whitespace();
        }

        if self.input.peek() == Some(b'[') {
            self.skip_internal_subset()?;
            self.input.skip_whitespace();
        }
        self.input.expect_byte(b'>')?;

        let value = if ids.is_empty() {
            ParsedValue::Text(String::new())
        } else {
            ParsedValue::Object(ids)
        };
        out.push(format!("!{name}"), value);
        Ok(())
    }

    /// Skips `[ ... ]`, stepping over quoted literals and comments so that
    /// brackets inside them do not end the subset.
    fn skip_internal_subset(&mut self) -> Result<(), ParseError> {
        self.input.expect_byte(b'[')?;
        loop {
            if self.input.at_end() {
                return Err(self.input.fatal("unexpected end of input in internal subset"));
            }
            if self.input.looking_at(b"<!--") {
                parse_comment_content(&mut self.input)?;
            } else if let Some(b'"' | b'\'') = self.input.peek() {
                self.input.parse_quoted_value()?;
            } else if self.input.next_byte()? == b']' {
                break;
            }
        }
        tracing::debug!("internal DTD subset skipped");
        Ok(())
    }

    fn parse_element(&mut self, out: &mut ParsedObject) -> Result<(), ParseError> {
        if self.depth >= self.options.max_depth {
            return Err(self.input.fatal(format!(
                "maximum nesting depth of {} exceeded",
                self.options.max_depth
            )));
        }
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;
        let mut content = ParsedObject::new();

        loop {
            let had_ws = self.input.skip_whitespace();
            match self.input.peek() {
                Some(b'/') => {
                    self.input.expect_str(b"/>")?;
                    out.push(name, collapse_element(content));
                    return Ok(());
                }
                Some(b'>') => {
                    self.input.advance(1);
                    break;
                }
                Some(_) => {
                    if !had_ws {
                        return Err(self.input.fatal("whitespace required before attribute"));
                    }
                    let attr_name = self.input.parse_name()?;
                    self.input.skip_whitespace();
                    self.input.expect_byte(b'=')?;
                    self.input.skip_whitespace();
                    let value = self.input.parse_attribute_value()?;
                    let key = format!("@_{attr_name}");
                    if content.get(&key).is_some() {
                        return Err(self
                            .input
                            .fatal(format!("duplicate attribute: {attr_name}")));
                    }
                    content.push(key, value);
                }
                None => return Err(self.input.fatal("unexpected end of input in start tag")),
            }
        }

        self.depth += 1;
        self.parse_content(&mut content)?;
        self.depth -= 1;

        self.input.expect_str(b"</")?;
        let end_name = self.input.parse_name()?;
        if end_name != name {
            return Err(self.input.fatal(format!(
                "mismatched end tag: expected </{name}>, found </{end_name}>"
            )));
        }
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')?;

        out.push(name, collapse_element(content));
        Ok(())
    }

    /// Reads element content up to (not including) the end tag.
    fn parse_content(&mut self, content: &mut ParsedObject) -> Result<(), ParseError> {
        let mut text = String::new();
        loop {
            if self.input.at_end() {
                return Err(self.input.fatal("unexpected end of input in element content"));
            }
            if self.input.looking_at(b"</") {
                self.flush_text(&mut text, content);
                return Ok(());
            }
            if self.input.looking_at(b"<!--") {
                self.flush_text(&mut text, content);
                content.push("#comment", parse_comment_content(&mut self.input)?);
            } else if self.input.looking_at(b"<![CDATA[") {
                self.flush_text(&mut text, content);
                content.push("#cdata", parse_cdata_content(&mut self.input)?);
            } else if self.input.looking_at(b"<?") {
                self.flush_text(&mut text, content);
                let (target, data) = parse_pi_content(&mut self.input)?;
                content.push(format!("?{target}"), data);
            } else if self.input.looking_at(b"<!") {
                return Err(self.input.fatal("markup declaration not allowed in content"));
            } else if self.input.looking_at(b"<") {
                self.flush_text(&mut text, content);
                self.parse_element(content)?;
            } else if self.input.looking_at(b"&") {
                text.push(self.input.parse_reference()?);
            } else if self.input.looking_at(b"]]>") {
                return Err(self.input.fatal("']]>' not allowed in content"));
            } else {
                text.push(self.input.next_char()?);
            }
        }
    }

    fn flush_text(&self, text: &mut String, content: &mut ParsedObject) {
        if text.is_empty() {
            return;
        }
        let run = std::mem::take(text);
        if self.options.no_blanks && run.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r')) {
            return;
        }
        content.push("#text", run);
    }
}

fn declaration_object(decl: XmlDeclaration) -> ParsedObject {
    let mut object = ParsedObject::new().with("@_version", decl.version);
    if let Some(encoding) = decl.encoding {
        object.push("@_encoding", encoding);
    }
    if let Some(standalone) = decl.standalone {
        object.push("@_standalone", standalone);
    }
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn read(input: &str) -> ParsedObject {
        parse_str(input, &ReadOptions::default()).unwrap()
    }

    fn read_json(input: &str) -> serde_json::Value {
        read(input).to_json()
    }

    #[test]
    fn test_element_forms() {
        assert_eq!(read_json("<r/>"), json!({"r": ""}));
        assert_eq!(read_json("<r></r>"), json!({"r": ""}));
        assert_eq!(read_json("<r>hi</r>"), json!({"r": "hi"}));
        assert_eq!(
            read_json("<r a='1' b=\"2\"/>"),
            json!({"r": {"@_a": "1", "@_b": "2"}})
        );
    }

    #[test]
    fn test_mixed_content_preserves_order() {
        let content = ParsedObject::new()
            .with("#text", "a")
            .with("b", "")
            .with("#text", "c")
            .with("#comment", "d")
            .with("#cdata", "<e>")
            .with("?f", "g");
        assert_eq!(
            read("<r>a<b/>c<!--d--><![CDATA[<e>]]><?f g?></r>"),
            ParsedObject::new().with("r", content)
        );
    }

    #[test]
    fn test_references_merge_into_one_text_run() {
        assert_eq!(
            read_json("<r>a &amp; b &#x41;&lt;</r>"),
            json!({"r": "a & b A<"})
        );
    }

    #[test]
    fn test_attribute_value_normalization() {
        assert_eq!(
            read_json("<r a=\"x&quot;y\nz\"/>"),
            json!({"r": {"@_a": "x\"y z"}})
        );
    }

    #[test]
    fn test_prolog() {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
                     <!-- c -->\n<!DOCTYPE r PUBLIC \"-//X//EN\" \"r.dtd\">\n<?pi?>\n<r/>";
        let declaration = ParsedObject::new()
            .with("@_version", "1.0")
            .with("@_encoding", "UTF-8")
            .with("@_standalone", "yes");
        let doctype = ParsedObject::new()
            .with("@_public", "-//X//EN")
            .with("@_system", "r.dtd");
        let expected = ParsedObject::new()
            .with("?xml", declaration)
            .with("#comment", " c ")
            .with("!r", doctype)
            .with("?pi", "")
            .with("r", "");
        assert_eq!(read(input), expected);
        assert!(read_json(input).is_object());
    }

    #[test]
    fn test_doctype_forms() {
        assert_eq!(read_json("<!DOCTYPE r><r/>"), json!({"!r": "", "r": ""}));
        assert_eq!(
            read_json("<!DOCTYPE r SYSTEM 'r.dtd' [<!ENTITY e \"]\"> <!-- ] -->]><r/>"),
            json!({"!r": {"@_system": "r.dtd"}, "r": ""})
        );
    }

    #[test]
    fn test_xml_stylesheet_is_a_pi() {
        assert_eq!(
            read_json("<?xml-stylesheet href=\"s.css\"?><r/>"),
            json!({"?xml-stylesheet": "href=\"s.css\"", "r": ""})
        );
    }

    #[test]
    fn test_whitespace_handling() {
        assert_eq!(read_json("<r> </r>"), json!({"r": " "}));
        let content = ParsedObject::new()
            .with("#text", "\n  ")
            .with("a", "")
            .with("#text", "\n");
        assert_eq!(
            read("<r>\n  <a/>\n</r>"),
            ParsedObject::new().with("r", content)
        );
        let parsed = parse_str(
            "<r>\n  <a/>\n</r>",
            &ReadOptions::default().no_blanks(true),
        )
        .unwrap();
        assert_eq!(parsed.to_json(), json!({"r": {"a": ""}}));
    }

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(read_json("<r>a\r\nb\rc</r>"), json!({"r": "a\nb\nc"}));
    }

    #[test]
    fn test_bom_is_ignored() {
        assert_eq!(read_json("\u{FEFF}<r/>"), json!({"r": ""}));
    }

    #[test]
    fn test_well_formedness_errors() {
        for input in [
            "",
            "text",
            "<r>",
            "<r></s>",
            "<r/><s/>",
            "<r a='1' a='2'/>",
            "<r a='1'b='2'/>",
            "<r>&unknown;</r>",
            "<r>]]></r>",
            "<r><!DOCTYPE x></r>",
            "<r/><!DOCTYPE r>",
            "<r><?xml version='1.0'?></r>",
            "<r>\u{1}</r>",
        ] {
            assert!(
                parse_str(input, &ReadOptions::default()).is_err(),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_error_location() {
        let err = parse_str("<r>\n  <a></b>\n</r>", &ReadOptions::default()).unwrap_err();
        assert_eq!(err.location.line, 2);
        assert!(err.message.contains("mismatched end tag"));
    }

    #[test]
    fn test_max_depth() {
        let options = ReadOptions::default().max_depth(2);
        assert!(parse_str("<a><b/></a>", &options).is_ok());
        let err = parse_str("<a><b><c/></b></a>", &options).unwrap_err();
        assert!(err.message.contains("nesting depth"));
    }

    #[test]
    fn test_parse_bytes_utf16() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "<r>\u{263A}</r>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let parsed = parse_bytes(&bytes, &ReadOptions::default()).unwrap();
        assert_eq!(parsed.to_json(), json!({"r": "\u{263A}"}));
    }
}
