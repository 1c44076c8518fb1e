//! Rule engine behaviour over several control cycles.
//!
//! The engine runs against the factory device with [`MockHardware`] for
//! sensors and pins and a hand-driven [`FixedClock`].

use relaymini::app::ports::ClockPort;
use relaymini::config::ControllerConfig;
use relaymini::engine::RuleEngine;
use relaymini::model::{Device, OutputCommand};
use relaymini::store::factory::factory_device;

use crate::mock_hw::{FixedClock, LogSink, MockHardware};

/// Factory pin of the current sensor (analog, relay 5).
const CURRENT_PIN: u8 = 33;

fn cycle(
    engine: &mut RuleEngine,
    device: &mut Device,
    hw: &mut MockHardware,
    clock: &FixedClock,
    sink: &mut LogSink,
) {
    engine.cycle(device, hw, clock.uptime_ms(), clock.now(), sink);
}

// ── Edge-triggered action ─────────────────────────────────────

#[test]
fn overcurrent_action_fires_once_and_returns_on_clear() {
    let mut device = factory_device();
    device.actions_enabled = true;
    // Raw ADC counts instead of amps.
    device.actions[0].min = 500.0;
    device.actions[0].max = 1000.0;
    assert!(device.relay(0).unwrap().state, "factory relay 0 starts on");

    let mut engine = RuleEngine::new(&ControllerConfig::default());
    let mut hw = MockHardware::new();
    let clock = FixedClock::unsynced();
    let mut sink = LogSink::new();

    let mut levels = Vec::new();
    for raw in [300u16, 600, 1200, 400] {
        hw.analog.insert(CURRENT_PIN, raw);
        cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);
        clock.advance_ms(1000);
        levels.push(hw.level_of(0).unwrap());
    }

    assert_eq!(levels, vec![true, false, false, true]);
    assert_eq!(sink.count("ActionFired"), 1);
    assert_eq!(sink.count("ActionCleared"), 1);
}

#[test]
fn failed_sensor_read_never_fires() {
    let mut device = factory_device();
    device.actions_enabled = true;
    device.actions[0].min = 500.0;

    let mut engine = RuleEngine::new(&ControllerConfig::default());
    let mut hw = MockHardware::new();
    let clock = FixedClock::unsynced();
    let mut sink = LogSink::new();

    cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);
    assert!(device.sensor(7).unwrap().current_value.is_nan());
    assert_eq!(sink.count("ActionFired"), 0);
    assert!(device.relay(0).unwrap().state);
}

// ── Schedule windows ──────────────────────────────────────────

fn scheduled_device() -> Device {
    let mut device = factory_device();
    device.schedules_enabled = true;
    let s = &mut device.schedules[0];
    s.enabled = true;
    s.start = OutputCommand::new(1, true);
    s.end = OutputCommand::new(1, false);
    device
}

#[test]
fn schedule_window_applies_entry_and_exit_once_per_day() {
    let mut device = scheduled_device();
    let mut engine = RuleEngine::new(&ControllerConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();
    let clock = FixedClock::at(2026, 10, 16, 7, 59);

    let mut tick = |clock: &FixedClock, device: &mut Device, hw: &mut MockHardware| {
        cycle(&mut engine, device, hw, clock, &mut sink);
        hw.level_of(1).unwrap()
    };

    assert!(!tick(&clock, &mut device, &mut hw));
    clock.set(2026, 10, 16, 8, 0);
    assert!(tick(&clock, &mut device, &mut hw));
    clock.set(2026, 10, 16, 8, 1);
    assert!(tick(&clock, &mut device, &mut hw));
    clock.set(2026, 10, 16, 17, 59);
    assert!(tick(&clock, &mut device, &mut hw));
    clock.set(2026, 10, 16, 18, 0);
    assert!(!tick(&clock, &mut device, &mut hw));
    clock.set(2026, 10, 16, 18, 1);
    assert!(!tick(&clock, &mut device, &mut hw));
    clock.set(2026, 10, 17, 7, 59);
    assert!(!tick(&clock, &mut device, &mut hw));
    clock.set(2026, 10, 17, 8, 0);
    assert!(tick(&clock, &mut device, &mut hw));

    assert_eq!(sink.count("ScheduleOpened"), 2);
    assert_eq!(sink.count("ScheduleClosed"), 1);
}

#[test]
fn schedules_wait_for_a_valid_clock() {
    let mut device = scheduled_device();
    device.schedules[0].windows[0] = relaymini::model::TimeWindow::new("00:00", "23:59");
    let mut engine = RuleEngine::new(&ControllerConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();

    let clock = FixedClock::unsynced();
    cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);
    assert!(!device.schedules[0].active);

    clock.set(2026, 10, 16, 12, 0);
    cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);
    assert!(device.schedules[0].active);
}

// ── Relay arbitration ─────────────────────────────────────────

#[test]
fn timer_end_restores_its_own_cache_under_an_open_schedule() {
    let mut device = factory_device();
    device.relay_mut(0).unwrap().state = false;
    device.timers_enabled = true;
    device.timers_repeat = false;
    device.schedules_enabled = true;

    let timer = &mut device.timers[0];
    timer.duration = heapless::String::try_from("00:03:00").unwrap();
    timer.end = OutputCommand {
        return_on_clear: true,
        ..OutputCommand::new(0, false)
    };
    let sched = &mut device.schedules[0];
    sched.enabled = true;
    sched.start = OutputCommand::new(0, true);

    let mut engine = RuleEngine::new(&ControllerConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();
    let clock = FixedClock::at(2026, 10, 16, 7, 58);

    // 07:58 timer takes relay 0 (cache: off)
    cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);
    assert!(hw.level_of(0).unwrap());

    // 08:00 the window opens while the timer still runs
    for _ in 0..4 {
        clock.advance_ms(30_000);
        cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);
    }
    assert!(device.schedules[0].active);
    assert!(device.schedules[0].start.last_state, "schedule cached the timer's level");
    assert!(hw.level_of(0).unwrap());

    // 08:01 the timer ends and returns the relay to what it found
    for _ in 0..2 {
        clock.advance_ms(30_000);
        cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);
    }
    assert_eq!(sink.count("TimerFinished"), 1);
    assert!(!hw.level_of(0).unwrap());
    assert!(device.schedules[0].active, "schedule window is still open");
}

// ── Pin output ────────────────────────────────────────────────

#[test]
fn every_output_relay_is_written_each_cycle() {
    let mut device = factory_device();
    let mut engine = RuleEngine::new(&ControllerConfig::default());
    let mut hw = MockHardware::new();
    let clock = FixedClock::unsynced();
    let mut sink = LogSink::new();

    cycle(&mut engine, &mut device, &mut hw, &clock, &mut sink);

    let written: Vec<_> = hw.writes.iter().map(|w| (w.pin, w.level)).collect();
    assert_eq!(written, vec![(3, true), (18, false), (19, true), (21, false)]);
}
