#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlforge::{build_element, from_json_str, DEFAULT_ROOT};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(structure) = from_json_str(s) {
            if let Ok(element) = build_element(structure, DEFAULT_ROOT) {
                let _ = element.to_xml_string();
            }
        }
    }
});
