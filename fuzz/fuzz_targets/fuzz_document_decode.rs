//! Fuzz target: device document decode
//!
//! Feeds arbitrary bytes through the same path a stored or uploaded
//! document takes and asserts that a rejected document never touches the
//! device, and an accepted one re-encodes and decodes to itself.
//!
//! cargo fuzz run fuzz_document_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaymini::codec::{self, DevicePatch};
use relaymini::store::factory::factory_device;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = codec::parse_bytes(data) else {
        return;
    };

    let mut device = factory_device();
    match DevicePatch::parse(&document) {
        Ok(patch) => {
            patch.apply(&mut device);
            let encoded = codec::encode_device(&device);
            let back = codec::hydrate(&encoded).expect("encoded device must decode");
            let mut settled = device.clone();
            settled.clear_runtime();
            assert_eq!(codec::encode_device(&back), codec::encode_device(&settled));
        }
        Err(_) => assert_eq!(device, factory_device(), "rejected patch leaked"),
    }

    // Store-level split must agree with single-profile decode on objects.
    if let Ok(profiles) = codec::split_profiles(document) {
        let index = codec::selected_index(&profiles);
        assert!(index < profiles.len());
        let _ = codec::hydrate(&profiles[index]);
    }
});
