#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlbridge::convert::{to_target_tree, ConvertOptions};
use xmlbridge::parsed::ParsedObject;
use xmlbridge::serial::serialize;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Arbitrary JSON trees must convert or fail cleanly, never panic.
        if let Ok(parsed) = ParsedObject::from_json_str(s) {
            if let Ok(doc) = to_target_tree(&parsed, &ConvertOptions::default()) {
                let _ = serialize(&doc);
            }
        }
    }
});
