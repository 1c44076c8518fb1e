//! Fuzz target: `set_field`
//!
//! Splits the input into a field path and a JSON value and applies it to
//! the factory device.  A failed update must leave the device untouched.
//!
//! cargo fuzz run fuzz_set_field

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaymini::codec;
use relaymini::store::factory::factory_device;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let (path, raw) = text.split_once('=').unwrap_or((text, "1"));
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return;
    };

    let mut device = factory_device();
    if codec::set_field(&mut device, path, &value).is_err() {
        assert_eq!(device, factory_device(), "failed set_field mutated the device");
    }
});
