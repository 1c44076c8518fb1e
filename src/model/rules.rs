//! Rule records: sensor actions, schedules, timers and the temperature loop.

use super::{DateText, Label, Message, OutputCommand, RelayId, SensorId, TimeText, text};
use crate::bits::{MonthMask, OptionMask, WeekMask};

// ── Sensor-triggered action ───────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Action {
    pub label: Label,
    pub enabled: bool,
    /// Relay whose level gates the action (`trd`, -1 on the wire for none).
    pub precondition_relay: Option<RelayId>,
    /// Required level of the precondition relay (`rmb`).
    pub precondition_on: bool,
    pub sensor_id: SensorId,
    /// `tvm`
    pub max: f32,
    /// `tvi`
    pub min: f32,
    /// Compare the humidity reading instead of the primary value.
    pub use_humidity: bool,
    /// `true`: fires while reading >= min.  `false`: fires while reading < max.
    pub more_or_equal: bool,
    /// Allow effects marked `return_on_clear` to restore on the falling edge.
    pub auto_return: bool,
    /// Edge latch (`wtr`).
    pub triggered: bool,
    pub message: Message,
    pub options: OptionMask,
    pub outputs: Vec<OutputCommand>,
}

// ── Schedule scenario ─────────────────────────────────────────

/// Time-of-day interval, `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeWindow {
    pub start: TimeText,
    pub end: TimeText,
}

impl TimeWindow {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: text(start),
            end: text(end),
        }
    }
}

/// Per-occurrence latches; persisted as `ltc[4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleLatches {
    pub initial_applied: bool,
    pub end_applied: bool,
    pub temperature_applied: bool,
    pub timers_applied: bool,
}

impl ScheduleLatches {
    pub fn to_array(self) -> [bool; 4] {
        [
            self.initial_applied,
            self.end_applied,
            self.temperature_applied,
            self.timers_applied,
        ]
    }

    pub fn merge(&mut self, values: &[bool]) {
        let slots = [
            &mut self.initial_applied,
            &mut self.end_applied,
            &mut self.temperature_applied,
            &mut self.timers_applied,
        ];
        for (slot, v) in slots.into_iter().zip(values) {
            *slot = *v;
        }
    }
}

/// Option bit: engage the temperature loop while the window is open.
pub const SCHEDULE_ENGAGES_TEMPERATURE: usize = 0;
/// Option bit: re-arm every enabled timer when the window opens.
pub const SCHEDULE_ARMS_TIMERS: usize = 1;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleScenario {
    pub label: Label,
    pub enabled: bool,
    /// Window currently open (`iac`).
    pub active: bool,
    pub options: OptionMask,
    pub start_date: DateText,
    pub end_date: DateText,
    pub windows: Vec<TimeWindow>,
    pub weekdays: WeekMask,
    pub months: MonthMask,
    pub start: OutputCommand,
    pub end: OutputCommand,
    pub latches: ScheduleLatches,
}

// ── Countdown timer ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerProgress {
    pub elapsed_ms: u32,
    pub remaining_ms: u32,
    pub running: bool,
    pub stopped: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timer {
    pub enabled: bool,
    /// `hh:mm:ss`
    pub duration: TimeText,
    pub options: OptionMask,
    pub start: OutputCommand,
    pub end: OutputCommand,
    pub progress: TimerProgress,
}

impl Timer {
    /// Enabled, idle and not waiting for a manual re-arm.
    pub fn is_armed(&self) -> bool {
        self.enabled && !self.progress.running && !self.progress.stopped
    }

    pub fn rearm(&mut self) {
        self.progress = TimerProgress::default();
    }
}

// ── Temperature loop ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemperatureControl {
    pub enabled: bool,
    pub relay_id: RelayId,
    pub last_state: bool,
    pub sensor_id: SensorId,
    /// Setpoint in °C (`stT`).
    pub target: f32,
    /// Last reading fed to the loop (`ctp`).
    pub current: f32,
    pub smoothing: bool,
    /// `true` heats (relay on below setpoint), `false` cools.
    pub heating: bool,
    pub options: OptionMask,
    pub pid_index: u8,
    /// The loop has saved its relay and is driving it.  Not persisted.
    pub engaged: bool,
    /// On-time within the proportioning window.  Not persisted.
    pub output_ms: f32,
}

// ── PID gains ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PidProfile {
    pub label: Label,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidProfile {
    pub fn new(label: &str, kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            label: text(label),
            kp,
            ki,
            kd,
        }
    }
}
