#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    argline::fuzz_tokenize_bytes(data);
});
