//! ControllerService: cycle orchestration, command dispatch, persistence.

use relaymini::Error;
use relaymini::app::commands::AppCommand;
use relaymini::app::service::ControllerService;
use relaymini::codec;
use relaymini::config::ControllerConfig;
use relaymini::model::OutputCommand;
use relaymini::store::factory::factory_device;
use relaymini::store::{DOCUMENT_KEY, NAMESPACE};
use serde_json::json;

use crate::mock_hw::{FixedClock, LogSink, MockHardware, MockNvs};

fn make_service() -> (ControllerService<MockNvs>, MockHardware, FixedClock, LogSink) {
    let mut sink = LogSink::new();
    let service = ControllerService::boot(ControllerConfig::default(), MockNvs::new(), &mut sink);
    (service, MockHardware::new(), FixedClock::unsynced(), sink)
}

fn stored_name(service: &ControllerService<MockNvs>) -> String {
    let bytes = service.store().storage().blob(NAMESPACE, DOCUMENT_KEY).unwrap();
    let device = codec::hydrate(&codec::parse_bytes(bytes).unwrap()).unwrap();
    device.name.to_string()
}

// ── Tick ──────────────────────────────────────────────────────

#[test]
fn tick_drives_output_pins_from_the_model() {
    let (mut service, mut hw, clock, mut sink) = make_service();
    service.tick(&mut hw, &clock, &mut sink);

    assert_eq!(service.tick_count(), 1);
    assert_eq!(hw.level_of(0), Some(true));
    assert_eq!(hw.level_of(1), Some(false));
    assert_eq!(hw.level_of(4), None, "input relays are never driven");
}

#[test]
fn manual_command_reaches_the_pin_on_the_next_tick() {
    let (mut service, mut hw, clock, mut sink) = make_service();
    service
        .handle_command(
            AppCommand::Relay {
                id: Some(1),
                action: "on".into(),
            },
            &mut sink,
        )
        .unwrap();
    service.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.level_of(1), Some(true));
}

#[test]
fn sensor_readings_land_in_the_model() {
    let (mut service, mut hw, clock, mut sink) = make_service();
    hw.analog.insert(33, 812);
    service.tick(&mut hw, &clock, &mut sink);

    let device = service.handle().active_device();
    assert_eq!(device.sensor(7).unwrap().current_value, 812.0);
    assert!(device.sensor(6).unwrap().current_value.is_nan());
    assert!(service.handle().sensor_summary().contains("analog=812"));
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn rejected_commands_change_nothing() {
    let (mut service, _hw, _clock, mut sink) = make_service();
    let before = service.handle().active_device();

    let err = service
        .handle_command(
            AppCommand::Relay {
                id: Some(42),
                action: "on".into(),
            },
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, Error::Command("relay not found"));

    let err = service
        .handle_command(AppCommand::UpdateDevice(b"{not json".to_vec()), &mut sink)
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));

    let err = service
        .handle_command(
            AppCommand::SetField {
                path: "act[9].use".into(),
                value: json!(1),
            },
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));

    assert_eq!(service.handle().active_device(), before);
    assert!(!service.handle().is_dirty());
}

#[test]
fn uploaded_document_merges_into_the_active_device() {
    let (mut service, _hw, _clock, mut sink) = make_service();
    let upload = serde_json::to_vec(&json!({"nmd": "Porch", "ite": 1})).unwrap();
    service
        .handle_command(AppCommand::UpdateDevice(upload), &mut sink)
        .unwrap();

    let device = service.handle().active_device();
    assert_eq!(device.name.as_str(), "Porch");
    assert!(device.timers_enabled);
    assert_eq!(device.relays, factory_device().relays, "absent keys keep their value");
    assert!(service.handle().is_dirty());
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn auto_save_waits_for_the_quiet_period() {
    let (mut service, mut hw, clock, mut sink) = make_service();
    let delay = u64::from(service.config().autosave_delay_ms);

    service.tick(&mut hw, &clock, &mut sink);
    service.handle().set_field("nmd", &json!("Shed")).unwrap();

    clock.advance_ms(delay - 1);
    service.tick(&mut hw, &clock, &mut sink);
    assert_eq!(stored_name(&service), "MyDevice1");
    assert!(service.handle().is_dirty());

    clock.advance_ms(1);
    service.tick(&mut hw, &clock, &mut sink);
    assert_eq!(stored_name(&service), "Shed");
    assert!(!service.handle().is_dirty());
    assert_eq!(sink.count("Saved"), 1);
}

#[test]
fn rule_changes_are_persisted() {
    let (mut service, mut hw, _clock, mut sink) = make_service();
    service.handle().with(|s| {
        s.device.schedules_enabled = true;
        let sched = &mut s.device.schedules[0];
        sched.enabled = true;
        sched.start = OutputCommand::new(1, true);
        sched.end = OutputCommand::new(1, false);
    });
    service.save_now(&mut sink).unwrap();
    assert!(!service.handle().is_dirty());

    let clock = FixedClock::at(2026, 10, 16, 8, 0);
    service.tick(&mut hw, &clock, &mut sink);
    assert!(service.handle().is_dirty());
    assert!(service.force_save_if_dirty(&mut sink).unwrap());

    let bytes = service.store().storage().blob(NAMESPACE, DOCUMENT_KEY).unwrap();
    let stored = codec::parse_bytes(bytes).unwrap();
    assert_eq!(stored["sch"][0]["ltc"][0], json!(1));
    assert_eq!(stored["rel"][1]["stp"], json!(1));

    // A quiet cycle inside the same window leaves the store clean.
    clock.advance_ms(1000);
    service.tick(&mut hw, &clock, &mut sink);
    assert!(!service.handle().is_dirty());
}

#[test]
fn force_save_flushes_only_when_dirty() {
    let (mut service, _hw, _clock, mut sink) = make_service();
    let writes_at_boot = service.store().storage().writes;

    assert!(!service.force_save_if_dirty(&mut sink).unwrap());
    assert_eq!(service.store().storage().writes, writes_at_boot);

    service.handle().set_field("iae", &json!(true)).unwrap();
    assert!(service.force_save_if_dirty(&mut sink).unwrap());
    assert_eq!(service.store().storage().writes, writes_at_boot + 1);
    assert!(!service.handle().is_dirty());
}

#[test]
fn oversized_store_is_not_written() {
    let config = ControllerConfig {
        max_document_bytes: 1024,
        ..ControllerConfig::default()
    };
    let mut sink = LogSink::new();
    let mut service = ControllerService::boot(config, MockNvs::new(), &mut sink);
    assert_eq!(service.store().storage().writes, 0, "factory default exceeds the ceiling");

    let err = service.save_now(&mut sink).unwrap_err();
    assert!(matches!(err, Error::ResourceExhausted { limit: 1024, .. }));
    assert_eq!(service.store().storage().writes, 0);
}

#[test]
fn factory_reset_rewrites_the_store() {
    let (mut service, _hw, _clock, mut sink) = make_service();
    service.handle().set_field("nmd", &json!("Shed")).unwrap();
    service.save_now(&mut sink).unwrap();
    assert_eq!(stored_name(&service), "Shed");

    service
        .handle_command(AppCommand::FactoryReset, &mut sink)
        .unwrap();

    assert_eq!(service.handle().active_device(), factory_device());
    assert_eq!(stored_name(&service), "MyDevice1");
    assert!(!service.handle().is_dirty());
    assert_eq!(sink.count("FactoryReset"), 1);
}
