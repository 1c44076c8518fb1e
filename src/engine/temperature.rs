//! Step 5: time-proportioning temperature loop.
//!
//! The PID output is an on-time within a fixed window.  Heating drives the
//! relay on for that long; cooling inverts the level so the relay runs
//! while the reading is above the setpoint.  With smoothing the on-time
//! slews by at most one step per cycle, and PWM relays get a duty instead
//! of being switched.

use crate::arbiter::{RuleRef, restore_relay_state, save_relay_state};
use crate::config::ControllerConfig;
use crate::control::pid::{PidController, TimeProportioner};
use crate::model::{Device, RelayId};

pub struct TemperatureLoop {
    pid: PidController,
    window: TimeProportioner,
    /// Largest on-time change per cycle under smoothing (ms).
    step_ms: f32,
    last_ms: Option<u64>,
    /// Relay saved when the loop engaged.
    held: Option<RelayId>,
    /// The loop was last engaged by a schedule rather than by its own flag.
    forced: bool,
}

impl TemperatureLoop {
    pub fn new(config: &ControllerConfig) -> Self {
        let window_ms = config.pid_window_ms.max(1);
        let mut pid = PidController::new(0.0, 0.0, 0.0, 0.0);
        pid.set_limits(0.0, window_ms as f32);
        Self {
            pid,
            window: TimeProportioner::new(window_ms, 0),
            step_ms: window_ms as f32 * f32::from(config.smoothing_step_percent) / 100.0,
            last_ms: None,
            held: None,
            forced: false,
        }
    }

    /// Gains are stored per unit of error; one unit maps to a tenth of
    /// the window.
    fn gain_scale(&self) -> f32 {
        self.window.window_ms() as f32 / 10.0
    }

    /// Run one cycle.  `forced` is true while a schedule window holds the
    /// loop on regardless of its own enable flag.
    pub fn run(&mut self, device: &mut Device, forced: bool, now_ms: u64) {
        let temp = &device.temperature;
        if !(temp.enabled || forced) {
            self.disengage(device);
            return;
        }
        let relay_id = temp.relay_id;
        let reading = device
            .sensor(temp.sensor_id)
            .map(|s| s.current_value)
            .filter(|v| v.is_finite());
        let gains = device.pid_profile().map(|p| (p.kp, p.ki, p.kd));
        let (Some(reading), Some((kp, ki, kd)), true) =
            (reading, gains, device.relay(relay_id).is_some())
        else {
            return;
        };

        // Retargeted while running: the new relay has no saved level yet.
        if device.temperature.engaged && self.held != Some(relay_id) {
            device.temperature.engaged = false;
        }
        if !device.temperature.engaged {
            save_relay_state(device, relay_id);
            self.held = Some(relay_id);
            self.window.restart(now_ms);
            self.pid.reset();
            self.last_ms = None;
            device.temperature.engaged = true;
        }
        self.forced = forced && !device.temperature.enabled;

        let scale = self.gain_scale();
        self.pid.set_tunings(kp * scale, ki * scale, kd * scale);
        self.pid.set_target(device.temperature.target);
        let dt = self
            .last_ms
            .map_or(0.0, |last| now_ms.saturating_sub(last) as f32 / 1000.0);
        self.last_ms = Some(now_ms);
        let wanted = self.pid.compute(reading, dt);

        let temp = &mut device.temperature;
        temp.current = reading;
        temp.output_ms = if temp.smoothing {
            temp.output_ms + (wanted - temp.output_ms).clamp(-self.step_ms, self.step_ms)
        } else {
            wanted
        };
        let on_ms = temp.output_ms;
        let heating = temp.heating;
        let smoothing = temp.smoothing;
        let window = self.window.window_ms() as f32;
        let level = self.window.is_on(on_ms, now_ms) == heating;

        if let Some(relay) = device.relay_mut(relay_id) {
            if relay.is_pwm && smoothing {
                let duty = (on_ms / window * 255.0).clamp(0.0, 255.0) as u8;
                relay.pwm = if heating { duty } else { 255 - duty };
                relay.state = relay.pwm > 0;
            } else {
                relay.state = level;
            }
        }
    }

    /// Release the relay.  Only a schedule-forced run restores it; turning
    /// the loop off through its own flag leaves the relay where it is.
    fn disengage(&mut self, device: &mut Device) {
        if !device.temperature.engaged {
            return;
        }
        if self.forced {
            restore_relay_state(device, device.temperature.relay_id, RuleRef::Temperature);
        }
        device.temperature.engaged = false;
        device.temperature.output_ms = 0.0;
        self.held = None;
        self.forced = false;
        self.pid.reset();
    }
}
