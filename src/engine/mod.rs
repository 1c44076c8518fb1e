//! Rule evaluation engine.
//!
//! One [`RuleEngine::cycle`] runs the five steps in a fixed order, each
//! able to see what the earlier steps wrote in the same cycle:
//!
//! ```text
//!   1. sensors      read every enabled sensor (NaN on failure)
//!   2. actions      edge-triggered threshold rules         (iae)
//!   3. timers       start / count down / finish            (ite)
//!   4. schedules    calendar windows, needs a valid clock  (ise)
//!   5. temperature  time-proportioning PID
//! ```
//!
//! Rules reach relays only through [`apply_output`] and the arbiter; pins
//! are written once at the end of the cycle.  A dangling id makes the rule
//! inert for the cycle and never aborts it.

pub mod actions;
pub mod calendar;
pub mod schedules;
pub mod sensors;
pub mod temperature;
pub mod timers;

use chrono::NaiveDateTime;
use log::trace;

use crate::app::ports::{EventSink, PinPort, SensorPort};
use crate::checksum;
use crate::config::ControllerConfig;
use crate::model::{Device, OutputCommand};

use self::sensors::SensorSample;
use self::temperature::TemperatureLoop;

pub struct RuleEngine {
    temperature: TemperatureLoop,
    last_cycle_ms: Option<u64>,
}

impl RuleEngine {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            temperature: TemperatureLoop::new(config),
            last_cycle_ms: None,
        }
    }

    /// Read, evaluate and write pins in one go.
    ///
    /// The service splits these phases around its lock; this is the
    /// single-owner form.
    pub fn cycle(
        &mut self,
        device: &mut Device,
        hw: &mut (impl SensorPort + PinPort),
        now_ms: u64,
        now: Option<NaiveDateTime>,
        sink: &mut impl EventSink,
    ) -> bool {
        let samples = sensors::read_samples(&sensors::read_plan(device), hw);
        let changed = self.evaluate(device, &samples, now_ms, now, sink);
        write_outputs(device, hw);
        changed
    }

    /// Steps 1 (store) to 5.  Returns `true` when a persisted field moved,
    /// i.e. the stored document is now stale.
    pub fn evaluate(
        &mut self,
        device: &mut Device,
        samples: &[SensorSample],
        now_ms: u64,
        now: Option<NaiveDateTime>,
        sink: &mut impl EventSink,
    ) -> bool {
        let before = checksum::rule_state_hash(device);
        let delta_ms = self.last_cycle_ms.map_or(0, |last| {
            u32::try_from(now_ms.saturating_sub(last)).unwrap_or(u32::MAX)
        });
        self.last_cycle_ms = Some(now_ms);

        sensors::store_samples(device, samples);

        if device.actions_enabled {
            actions::evaluate(device, sink);
        }
        if device.timers_enabled {
            timers::advance(device, delta_ms, sink);
        }
        if device.schedules_enabled {
            match now {
                Some(now) => schedules::evaluate(device, &now, sink),
                None => trace!("no valid clock, schedules skipped"),
            }
        }
        let forced = schedules::temperature_requested(device);
        self.temperature.run(device, forced, now_ms);

        checksum::rule_state_hash(device) != before
    }
}

/// Drive a relay as `cmd` asks.  Only output relays are touched; returns
/// `false` for a dangling or input relay.
pub fn apply_output(device: &mut Device, cmd: &OutputCommand) -> bool {
    match device.relay_mut(cmd.relay_id) {
        Some(relay) if relay.is_output => {
            relay.state = cmd.state;
            if cmd.is_pwm {
                relay.pwm = cmd.pwm;
            }
            true
        }
        _ => false,
    }
}

/// Push every output relay's level to its pin.
pub fn write_outputs(device: &Device, pins: &mut impl PinPort) {
    for relay in device.output_relays() {
        pins.write_pin(relay, relay.state);
    }
}
