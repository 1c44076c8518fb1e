//! ControllerHandle: the transport-facing operations.

use relaymini::Error;
use relaymini::app::upload::UploadBuffer;
use relaymini::codec;
use relaymini::config::ControllerConfig;
use relaymini::live::{ChangeTracker, SliceKind};
use relaymini::state::{AppState, ControllerHandle};
use relaymini::store::factory::factory_device;
use serde_json::{Value, json};

fn handle() -> ControllerHandle {
    let device = factory_device();
    let doc = codec::encode_device(&device);
    ControllerHandle::new(AppState::new(device, vec![doc], 0), &ControllerConfig::default())
}

fn keys(payload: &Value) -> Vec<&str> {
    let mut k: Vec<&str> = payload
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    k.sort_unstable();
    k
}

// ── Change detection ──────────────────────────────────────────

#[test]
fn sensor_reading_changes_only_the_sensor_hash() {
    let h = handle();
    let before = h.compute_change_hashes();

    h.with(|s| s.device.sensor_mut(7).unwrap().current_value = 0.75);
    let changed = h.compute_change_hashes();
    assert_ne!(changed.sensors, before.sensors);
    assert_eq!(changed.relays, before.relays);
    assert_eq!(changed.timers, before.timers);
    assert_eq!(changed.flags, before.flags);

    h.with(|s| s.device.sensor_mut(7).unwrap().current_value = 0.0);
    assert_eq!(h.compute_change_hashes(), before);
}

#[test]
fn live_poll_sends_only_changed_slices() {
    let h = handle();
    let mut tracker = ChangeTracker::new();

    let first = h.poll_live(&mut tracker, false);
    assert_eq!(
        keys(&first),
        vec!["relays_update", "sensors_update", "settings_update", "static_info"],
        "timers stay out while timers are disabled"
    );

    let quiet = h.poll_live(&mut tracker, false);
    assert_eq!(keys(&quiet), vec!["static_info"]);

    h.apply_relay_command(Some(1), "on").unwrap();
    let update = h.poll_live(&mut tracker, false);
    assert_eq!(keys(&update), vec!["relays_update", "static_info"]);
    assert_eq!(update["relays_update"]["rel"][1]["stp"], json!(1));

    h.set_field("ite", &json!(1)).unwrap();
    let update = h.poll_live(&mut tracker, false);
    assert_eq!(
        keys(&update),
        vec!["settings_update", "static_info", "timers_update"]
    );

    let forced = h.poll_live(&mut tracker, true);
    assert_eq!(keys(&forced).len(), 5);
}

#[test]
fn failed_reading_serializes_as_null() {
    let h = handle();
    h.with(|s| s.device.sensor_mut(6).unwrap().current_value = f32::NAN);
    let slice = h.serialize_slice(SliceKind::Sensors);
    assert_eq!(slice["sen"][0]["cv"], Value::Null);
    assert_eq!(slice["sen"][1]["cv"], json!(0.0));
}

// ── Relay commands ────────────────────────────────────────────

#[test]
fn repeated_relay_command_is_idempotent() {
    let h = handle();
    h.apply_relay_command(Some(2), "off").unwrap();
    let once = h.active_device();
    h.apply_relay_command(Some(2), "off").unwrap();
    assert_eq!(h.active_device(), once);
}

#[test]
fn reset_all_drops_every_output() {
    let h = handle();
    h.apply_relay_command(None, "reset_all").unwrap();
    let d = h.active_device();
    assert!(d.output_relays().all(|r| !r.state && !r.manual));
    assert_eq!(
        h.apply_relay_command(None, "on"),
        Err(Error::Command("relay id required"))
    );
    assert_eq!(
        h.apply_relay_command(Some(0), "toggle"),
        Err(Error::Command("unknown action"))
    );
}

// ── Field updates ─────────────────────────────────────────────

#[test]
fn set_fields_applies_known_paths() {
    let h = handle();
    let applied = h
        .set_fields(&json!({
            "tmp.stT": 24.5,
            "pid[1].Kp": 3.0,
            "rel[0].dsc": "Heater",
            "nonsense": 1,
        }))
        .unwrap();
    assert_eq!(applied, 3);

    let d = h.active_device();
    assert_eq!(d.temperature.target, 24.5);
    assert_eq!(d.pids[1].kp, 3.0);
    assert_eq!(d.relays[0].label.as_str(), "Heater");
}

#[test]
fn set_fields_with_nothing_known_is_rejected() {
    let h = handle();
    assert!(h.set_fields(&json!({"nonsense": 1})).is_err());
    assert!(!h.is_dirty());
}

#[test]
fn reenabling_a_timer_rearms_it() {
    let h = handle();
    h.with(|s| {
        let t = &mut s.device.timers[0];
        t.progress.stopped = true;
        t.progress.elapsed_ms = 5000;
    });
    h.set_field("tmr[0].use", &json!(0)).unwrap();
    h.set_field("tmr[0].use", &json!(1)).unwrap();
    assert!(h.active_device().timers[0].is_armed());
}

// ── Uploads ───────────────────────────────────────────────────

#[test]
fn streamed_upload_is_bounded_by_the_upload_limit() {
    let config = ControllerConfig::default();
    let limit = config.upload_limit();
    let h = handle();

    let mut upload = UploadBuffer::begin(None, limit).unwrap();
    for chunk in br#"{"nmd":"Chunked","iae":1}"#.chunks(7) {
        upload.push(chunk).unwrap();
    }
    h.update_device_from_document(&upload.into_bytes()).unwrap();
    assert_eq!(h.active_device().name.as_str(), "Chunked");

    assert!(matches!(
        UploadBuffer::begin(Some(limit + 1), limit),
        Err(Error::ResourceExhausted { .. })
    ));
    let oversized = vec![b' '; limit + 1];
    assert!(matches!(
        h.update_device_from_document(&oversized),
        Err(Error::ResourceExhausted { .. })
    ));
}
