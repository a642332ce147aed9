#![no_main]
use libfuzzer_sys::fuzz_target;
use torken::{DecryptOptions, Tokenizer, Value};

fuzz_target!(|data: &[u8]| {
    let token = String::from_utf8_lossy(data);
    let tokenizer = Tokenizer::new();
    let _ = tokenizer.decrypt::<Value, _>(&token, b"fuzz key", &DecryptOptions::new());
});
