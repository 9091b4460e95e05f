#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlbridge::convert::{to_parsed, to_target_tree, ConvertOptions};
use xmlbridge::reader::{parse_bytes, parse_str, ReadOptions};
use xmlbridge::serial::serialize;

fuzz_target!(|data: &[u8]| {
    let opts = ReadOptions::default();
    // Read -> convert -> render -> read should never panic, and a rendered
    // tree must read back to what the tree converts back to.
    if let Ok(parsed) = parse_bytes(data, &opts) {
        if let Ok(doc) = to_target_tree(&parsed, &ConvertOptions::default()) {
            let output = serialize(&doc);
            if let Ok(again) = parse_str(&output, &opts) {
                assert_eq!(again, to_parsed(&doc));
            }
        }
    }
});
