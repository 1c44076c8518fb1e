use serde_json::Value;

use super::DecodeError;
use super::reader::{Fields, as_int};
use crate::bits::{MonthMask, OptionMask, TypeMask, WeekMask};
use crate::model::{
    Action, Device, Label, OutputCommand, PidProfile, Relay, RelayId, ScheduleScenario, Sensor,
    SensorId, TimeWindow, Timer,
};

/// Everything a document wants to change, fully validated.
///
/// Built without touching the live model; [`apply`](Self::apply) only moves
/// values into place and cannot fail.
#[derive(Debug, Clone, Default)]
pub struct DevicePatch {
    pub name: Option<Label>,
    pub selected: Option<bool>,
    pub pins: Option<Vec<u8>>,
    pub relays: Option<Vec<Relay>>,
    pub sensors: Option<Vec<Sensor>>,
    pub actions: Option<Vec<Action>>,
    pub schedules: Option<Vec<ScheduleScenario>>,
    pub timers: Option<Vec<Timer>>,
    pub pids: Option<Vec<PidProfile>>,
    pub temperature: Option<TemperaturePatch>,
    pub timers_enabled: Option<bool>,
    pub timers_repeat: Option<bool>,
    pub schedules_enabled: Option<bool>,
    pub actions_enabled: Option<bool>,
}

/// Field-level merge for the single temperature block.
#[derive(Debug, Clone, Default)]
pub struct TemperaturePatch {
    pub enabled: Option<bool>,
    pub relay_id: Option<RelayId>,
    pub last_state: Option<bool>,
    pub sensor_id: Option<SensorId>,
    pub target: Option<f32>,
    pub current: Option<f32>,
    pub smoothing: Option<bool>,
    pub heating: Option<bool>,
    pub options: Option<Vec<bool>>,
    pub pid_index: Option<u8>,
}

fn assign<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl DevicePatch {
    pub fn parse(document: &Value) -> Result<Self, DecodeError> {
        let f = Fields::of(document, "device").map_err(|_| DecodeError::NotAnObject)?;

        // `pinL` wins when both pin lists are present.
        let pins = match f.list("pinL", |v| as_int::<u8>(v, "pinL"))? {
            Some(p) => Some(p),
            None => f.list("pins", |v| as_int::<u8>(v, "pins"))?,
        };

        Ok(Self {
            name: f.text("nmd")?,
            selected: f.flag("isl")?,
            pins,
            relays: f.list("rel", parse_relay)?,
            sensors: f.list("sen", parse_sensor)?,
            actions: f.list("act", parse_action)?,
            schedules: f.list("sch", parse_schedule)?,
            timers: f.list("tmr", parse_timer)?,
            pids: f.list("pid", parse_pid)?,
            temperature: f.object("tmp")?.map(|t| parse_temperature(&t)).transpose()?,
            timers_enabled: f.flag("ite")?,
            timers_repeat: f.flag("iet")?,
            schedules_enabled: f.flag("ise")?,
            actions_enabled: f.flag("iae")?,
        })
    }

    /// Move every present value into `device`.
    ///
    /// Each collection is published with a single assignment, so a reader
    /// holding the same lock never sees a half-built list.
    pub fn apply(self, device: &mut Device) {
        assign(&mut device.name, self.name);
        assign(&mut device.selected, self.selected);
        assign(&mut device.pins, self.pins);
        assign(&mut device.relays, self.relays);
        assign(&mut device.sensors, self.sensors);
        assign(&mut device.actions, self.actions);
        assign(&mut device.schedules, self.schedules);
        assign(&mut device.timers, self.timers);
        assign(&mut device.pids, self.pids);
        assign(&mut device.timers_enabled, self.timers_enabled);
        assign(&mut device.timers_repeat, self.timers_repeat);
        assign(&mut device.schedules_enabled, self.schedules_enabled);
        assign(&mut device.actions_enabled, self.actions_enabled);

        if let Some(t) = self.temperature {
            let block = &mut device.temperature;
            assign(&mut block.enabled, t.enabled);
            assign(&mut block.relay_id, t.relay_id);
            assign(&mut block.last_state, t.last_state);
            assign(&mut block.sensor_id, t.sensor_id);
            assign(&mut block.target, t.target);
            assign(&mut block.current, t.current);
            assign(&mut block.smoothing, t.smoothing);
            assign(&mut block.heating, t.heating);
            assign(&mut block.pid_index, t.pid_index);
            if let Some(bits) = t.options {
                block.options.merge(&bits);
            }
        }
    }

    /// True when the document carried no recognised key.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.selected.is_none()
            && self.pins.is_none()
            && self.relays.is_none()
            && self.sensors.is_none()
            && self.actions.is_none()
            && self.schedules.is_none()
            && self.timers.is_none()
            && self.pids.is_none()
            && self.temperature.is_none()
            && self.timers_enabled.is_none()
            && self.timers_repeat.is_none()
            && self.schedules_enabled.is_none()
            && self.actions_enabled.is_none()
    }
}

// ── List items ────────────────────────────────────────────────
//
// New items start from their defaults; only present keys are set.

fn parse_relay(v: &Value) -> Result<Relay, DecodeError> {
    let f = Fields::of(v, "rel")?;
    let mut r = Relay::default();
    assign(&mut r.id, f.int("id")?);
    assign(&mut r.pin, f.int("pin")?);
    assign(&mut r.manual, f.flag("man")?);
    assign(&mut r.state, f.flag("stp")?);
    assign(&mut r.is_output, f.flag("out")?);
    assign(&mut r.is_digital, f.flag("dig")?);
    assign(&mut r.last_state, f.flag("lst")?);
    assign(&mut r.label, f.text("dsc")?);
    assign(&mut r.is_pwm, f.flag("isPwm")?);
    assign(&mut r.pwm, f.int("pwm")?);
    Ok(r)
}

fn parse_sensor(v: &Value) -> Result<Sensor, DecodeError> {
    let f = Fields::of(v, "sen")?;
    let mut s = Sensor::default();
    assign(&mut s.label, f.text("dsc")?);
    assign(&mut s.enabled, f.flag("use")?);
    assign(&mut s.id, f.int("sid")?);
    assign(&mut s.relay_id, f.int("rid")?);
    if let Some(bits) = f.flags("typ")? {
        s.type_mask = TypeMask::empty();
        s.type_mask.merge(&bits);
    }
    assign(&mut s.series_ohms, f.float("ser")?);
    assign(&mut s.thermistor_ohms, f.float("thm")?);
    Ok(s)
}

fn parse_output(f: &Fields<'_>) -> Result<OutputCommand, DecodeError> {
    let mut o = OutputCommand::default();
    assign(&mut o.enabled, f.flag("use")?);
    assign(&mut o.relay_id, f.int("rid")?);
    assign(&mut o.state, f.flag("stp")?);
    assign(&mut o.last_state, f.flag("lst")?);
    assign(&mut o.return_on_clear, f.flag("rtn")?);
    assign(&mut o.is_pwm, f.flag("isPwm")?);
    assign(&mut o.pwm, f.int("pwm")?);
    Ok(o)
}

fn parse_output_value(v: &Value) -> Result<OutputCommand, DecodeError> {
    parse_output(&Fields::of(v, "outL")?)
}

fn parse_options(f: &Fields<'_>) -> Result<OptionMask, DecodeError> {
    let mut mask = OptionMask::empty();
    if let Some(bits) = f.flags("cls")? {
        mask.merge(&bits);
    }
    Ok(mask)
}

fn parse_action(v: &Value) -> Result<Action, DecodeError> {
    let f = Fields::of(v, "act")?;
    let mut a = Action {
        precondition_on: true,
        ..Action::default()
    };
    assign(&mut a.label, f.text("dsc")?);
    assign(&mut a.enabled, f.flag("use")?);
    if let Some(trd) = f.int::<i64>("trd")? {
        a.precondition_relay = if trd < 0 {
            None
        } else {
            Some(RelayId::try_from(trd).map_err(|_| DecodeError::OutOfRange("trd"))?)
        };
    }
    assign(&mut a.precondition_on, f.flag("rmb")?);
    assign(&mut a.sensor_id, f.int("tsd")?);
    assign(&mut a.max, f.float("tvm")?);
    assign(&mut a.min, f.float("tvi")?);
    assign(&mut a.use_humidity, f.flag("hum")?);
    assign(&mut a.more_or_equal, f.flag("ame")?);
    assign(&mut a.auto_return, f.flag("irs")?);
    assign(&mut a.triggered, f.flag("wtr")?);
    assign(&mut a.message, f.text("msg")?);
    a.options = parse_options(&f)?;
    assign(&mut a.outputs, f.list("outL", parse_output_value)?);
    Ok(a)
}

fn parse_window(v: &Value) -> Result<TimeWindow, DecodeError> {
    let f = Fields::of(v, "set")?;
    let mut w = TimeWindow::default();
    assign(&mut w.start, f.text("stm")?);
    assign(&mut w.end, f.text("etm")?);
    Ok(w)
}

fn parse_schedule(v: &Value) -> Result<ScheduleScenario, DecodeError> {
    let f = Fields::of(v, "sch")?;
    let mut s = ScheduleScenario::default();
    assign(&mut s.enabled, f.flag("use")?);
    assign(&mut s.label, f.text("dsc")?);
    assign(&mut s.active, f.flag("iac")?);
    s.options = parse_options(&f)?;
    assign(&mut s.start_date, f.text("sdt")?);
    assign(&mut s.end_date, f.text("edt")?);
    assign(&mut s.windows, f.list("set", parse_window)?);
    if let Some(bits) = f.flags("wek")? {
        s.weekdays = WeekMask::empty();
        s.weekdays.merge(&bits);
    }
    if let Some(bits) = f.flags("mon")? {
        s.months = MonthMask::empty();
        s.months.merge(&bits);
    }
    if let Some(o) = f.object("isr")? {
        s.start = parse_output(&o)?;
    }
    if let Some(o) = f.object("esr")? {
        s.end = parse_output(&o)?;
    }
    if let Some(bits) = f.flags("ltc")? {
        s.latches.merge(&bits);
    }
    Ok(s)
}

fn parse_timer(v: &Value) -> Result<Timer, DecodeError> {
    let f = Fields::of(v, "tmr")?;
    let mut t = Timer::default();
    assign(&mut t.enabled, f.flag("use")?);
    assign(&mut t.duration, f.text("tim")?);
    t.options = parse_options(&f)?;
    if let Some(o) = f.object("isr")? {
        t.start = parse_output(&o)?;
    }
    if let Some(o) = f.object("esr")? {
        t.end = parse_output(&o)?;
    }
    Ok(t)
}

fn parse_pid(v: &Value) -> Result<PidProfile, DecodeError> {
    let f = Fields::of(v, "pid")?;
    let mut p = PidProfile::default();
    assign(&mut p.label, f.text("dsc")?);
    assign(&mut p.kp, f.float("Kp")?);
    assign(&mut p.ki, f.float("Ki")?);
    assign(&mut p.kd, f.float("Kd")?);
    Ok(p)
}

fn parse_temperature(f: &Fields<'_>) -> Result<TemperaturePatch, DecodeError> {
    Ok(TemperaturePatch {
        enabled: f.flag("use")?,
        relay_id: f.int("rid")?,
        last_state: f.flag("lst")?,
        sensor_id: f.int("sid")?,
        target: f.float("stT")?,
        current: f.float("ctp")?,
        smoothing: f.flag("smt")?,
        heating: f.flag("inc")?,
        options: f.flags("cls")?,
        pid_index: f.int("spi")?,
    })
}
