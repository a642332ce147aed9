#![no_main]
use libfuzzer_sys::fuzz_target;
use torken::Value;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = torken::from_slice::<Value>(data) {
        let _ = torken::to_vec(&value);
    }
    let _ = torken::skip_value(data);
});
