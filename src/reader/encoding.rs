//! Byte-level encoding detection for the reader.
//!
//! Input is decoded in two steps: a Byte Order Mark selects UTF-8 or
//! UTF-16, and the `encoding=` pseudo-attribute of the XML declaration may
//! override the default. Everything else is UTF-8. Conversion goes through
//! `encoding_rs`.

use crate::error::{ParseError, SourceLocation};

/// Detects the encoding of a byte stream from its Byte Order Mark.
///
/// Returns the encoding label and the number of BOM bytes to skip.
pub(crate) fn detect_bom(bytes: &[u8]) -> (&'static str, usize) {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        ("UTF-8", 3)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        ("UTF-16BE", 2)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        ("UTF-16LE", 2)
    } else {
        ("UTF-8", 0)
    }
}

fn encoding_error(message: String) -> ParseError {
    ParseError {
        message,
        location: SourceLocation {
            line: 1,
            column: 1,
            byte_offset: 0,
        },
    }
}

/// Transcodes `bytes` from the encoding named `label` to UTF-8.
fn transcode(bytes: &[u8], label: &str) -> Result<String, ParseError> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| encoding_error(format!("unsupported encoding: {label}")))?;
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(encoding_error(format!(
            "malformed byte sequence for encoding {label}"
        )));
    }
    Ok(text.into_owned())
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("UTF-8") || label.eq_ignore_ascii_case("UTF8")
}

/// Scans the XML declaration at the start of `bytes` for an `encoding`
/// value. The declaration is ASCII in every encoding this reader accepts
/// without a BOM.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];
    let needle = b"encoding";
    let at = decl.windows(needle.len()).position(|w| w == needle)?;
    let rest = decl[at + needle.len()..].trim_ascii_start();
    let rest = rest.strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = rest.iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[..end]).ok().map(str::to_string)
}

/// Decodes raw XML bytes to a UTF-8 string.
///
/// A UTF-16 BOM wins over the declaration as long as the declaration names
/// UTF-16 of either byte order.
pub(crate) fn decode_to_utf8(bytes: &[u8]) -> Result<String, ParseError> {
    let (bom_encoding, skip) = detect_bom(bytes);
    let content = &bytes[skip..];

    if bom_encoding == "UTF-8" {
        if let Some(declared) = declared_encoding(content) {
            if !is_utf8_label(&declared) {
                tracing::debug!(encoding = %declared, "transcoding declared encoding");
                return transcode(content, &declared);
            }
        }
        return std::str::from_utf8(content)
            .map(str::to_string)
            .map_err(|e| encoding_error(format!("input is not valid UTF-8: {e}")));
    }

    let text = transcode(content, bom_encoding)?;
    if let Some(declared) = declared_encoding(text.as_bytes()) {
        if !declared.to_ascii_uppercase().starts_with("UTF-16") {
            return Err(encoding_error(format!(
                "declared encoding {declared} conflicts with {bom_encoding} byte order mark"
            )));
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_bom() {
        assert_eq!(detect_bom(b"\xEF\xBB\xBF<r/>"), ("UTF-8", 3));
        assert_eq!(detect_bom(b"\xFE\xFF"), ("UTF-16BE", 2));
        assert_eq!(detect_bom(b"\xFF\xFE"), ("UTF-16LE", 2));
        assert_eq!(detect_bom(b"<r/>"), ("UTF-8", 0));
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        assert_eq!(decode_to_utf8(b"\xEF\xBB\xBF<r/>").unwrap(), "<r/>");
    }

    #[test]
    fn test_decode_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<r>\u{E9}</r>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_to_utf8(&bytes).unwrap(), "<r>\u{E9}</r>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>\xE9</r>";
        let text = decode_to_utf8(bytes).unwrap();
        assert!(text.ends_with("<r>\u{E9}</r>"));
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode_to_utf8(b"<r>\xFF</r>").is_err());
        assert!(decode_to_utf8(b"<?xml version=\"1.0\" encoding=\"bogus\"?><r/>").is_err());
    }

    #[test]
    fn test_decode_utf16_lone_surrogate() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in [u16::from(b'<'), u16::from(b'r'), 0xD800, u16::from(b'/'), u16::from(b'>')] {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let err = decode_to_utf8(&bytes).unwrap_err();
        assert!(err.message.contains("malformed byte sequence"), "{}", err.message);
    }
}
