//! Name-level utilities.
//!
//! Contains the XML Name code point classifier, the Name/NCName/`QName`
//! validators, and the [`QName`](qname::QName) value type.

pub mod chars;
pub mod name;
pub mod qname;

pub use chars::{is_name_continuation_code_point, is_name_start_code_point};
pub use name::{
    is_valid_custom_id, is_valid_name_token, is_valid_ncname, is_valid_qname,
    is_valid_xml_name, is_valid_xml_name_utf16,
};
pub use qname::{split_qname, QName, QNameOptions};
