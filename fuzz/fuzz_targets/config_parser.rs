#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use xr_extension_mask::ShimConfig;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must be skipped line by line, never panic
    let _ = ShimConfig::parse(Cursor::new(data.to_vec()));
});
