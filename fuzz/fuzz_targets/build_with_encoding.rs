#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlforge::{build_with_options, Mapping, SerializeOptions, DEFAULT_ROOT};

const ENCODINGS: &[&str] = &["utf-8", "ascii", "utf-16", "utf-16be", "iso-8859-1", "shift_jis"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let label = ENCODINGS[usize::from(selector) % ENCODINGS.len()];
    let structure = Mapping::new().with("@value", text).with("#text", text);
    let _ = build_with_options(
        structure,
        DEFAULT_ROOT,
        &SerializeOptions::new().with_encoding(label),
    );
});
