//! Boot policy: first boot, stored profiles, corrupt store fallback.

use relaymini::app::service::ControllerService;
use relaymini::codec;
use relaymini::config::ControllerConfig;
use relaymini::store::factory::factory_device;
use relaymini::store::{DOCUMENT_KEY, NAMESPACE};
use serde_json::json;

use crate::mock_hw::{LogSink, MockNvs};

#[test]
fn first_boot_persists_the_factory_device() {
    let mut sink = LogSink::new();
    let service = ControllerService::boot(ControllerConfig::default(), MockNvs::new(), &mut sink);

    assert_eq!(service.handle().active_device(), factory_device());
    let stored = service.store().storage().blob(NAMESPACE, DOCUMENT_KEY).unwrap();
    let decoded = codec::hydrate(&codec::parse_bytes(stored).unwrap()).unwrap();
    assert_eq!(decoded, factory_device());
    assert!(sink.events[0].contains("FirstBoot"), "got {:?}", sink.events);
}

#[test]
fn corrupt_store_boots_exact_factory_and_keeps_the_file() {
    let corrupt = b"{\"nmd\": \"half a docu";
    let nvs = MockNvs::with_blob(NAMESPACE, DOCUMENT_KEY, corrupt);
    let mut sink = LogSink::new();

    let service = ControllerService::boot(ControllerConfig::default(), nvs, &mut sink);

    assert_eq!(service.handle().active_device(), factory_device());
    let storage = service.store().storage();
    assert_eq!(storage.blob(NAMESPACE, DOCUMENT_KEY).unwrap(), corrupt);
    assert_eq!(storage.writes, 0, "fallback must not overwrite the store");
    assert!(sink.events[0].contains("Fallback"));
    assert!(!service.handle().is_dirty());
}

#[test]
fn wrong_document_shape_also_falls_back() {
    let nvs = MockNvs::with_blob(NAMESPACE, DOCUMENT_KEY, b"[1, 2, 3]");
    let mut sink = LogSink::new();
    let service = ControllerService::boot(ControllerConfig::default(), nvs, &mut sink);
    assert_eq!(service.handle().active_device(), factory_device());
    assert_eq!(service.store().storage().writes, 0);
}

#[test]
fn selected_profile_is_hydrated_and_others_kept_verbatim() {
    let mut first = codec::encode_device(&factory_device());
    first["isl"] = json!(0);
    first["nmd"] = json!("Garage");
    let mut second = codec::encode_device(&factory_device());
    second["isl"] = json!(1);
    second["nmd"] = json!("Greenhouse");
    second["iae"] = json!(1);
    let bytes = serde_json::to_vec(&json!([first, second])).unwrap();

    let nvs = MockNvs::with_blob(NAMESPACE, DOCUMENT_KEY, &bytes);
    let mut sink = LogSink::new();
    let mut service = ControllerService::boot(ControllerConfig::default(), nvs, &mut sink);

    let handle = service.handle();
    let active = handle.active_device();
    assert_eq!(active.name.as_str(), "Greenhouse");
    assert!(active.actions_enabled);
    assert_eq!(handle.with(|s| s.active_index()), 1);
    assert!(sink.events[0].contains("Stored"));

    handle.set_field("nmd", &json!("Greenhouse 2")).unwrap();
    service.save_now(&mut sink).unwrap();

    let stored = service.store().storage().blob(NAMESPACE, DOCUMENT_KEY).unwrap();
    let doc = codec::parse_bytes(stored).unwrap();
    let profiles = doc.as_array().unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0], first, "inactive profile written back unchanged");
    assert_eq!(profiles[1]["nmd"], json!("Greenhouse 2"));
}
