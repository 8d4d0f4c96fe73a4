#![no_main]

use effrank::study::Study;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and validation should not panic regardless of input
        let _ = Study::from_toml(input);
    }
});
