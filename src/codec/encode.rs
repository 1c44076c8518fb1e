use serde_json::{Value, json};

use crate::model::{
    Action, Device, OutputCommand, PidProfile, Relay, ScheduleScenario, Sensor, TemperatureControl,
    Timer,
};

/// Full-graph document for one device, booleans already normalized.
pub fn encode_device(device: &Device) -> Value {
    let mut doc = json!({
        "nmd": device.name.as_str(),
        "isl": device.selected,
        "pins": device.pins,
        "pinL": device.pins,
        "rel": device.relays.iter().map(relay).collect::<Vec<_>>(),
        "sen": device.sensors.iter().map(sensor).collect::<Vec<_>>(),
        "act": device.actions.iter().map(action).collect::<Vec<_>>(),
        "sch": device.schedules.iter().map(schedule).collect::<Vec<_>>(),
        "tmp": temperature(&device.temperature),
        "pid": device.pids.iter().map(pid).collect::<Vec<_>>(),
        "tmr": device.timers.iter().map(timer).collect::<Vec<_>>(),
        "ite": device.timers_enabled,
        "iet": device.timers_repeat,
        "ise": device.schedules_enabled,
        "iae": device.actions_enabled,
    });
    normalize_flags(&mut doc);
    doc
}

/// Rewrite every boolean leaf as 0/1, recursively.
pub fn normalize_flags(value: &mut Value) {
    match value {
        Value::Bool(b) => *value = Value::from(u8::from(*b)),
        Value::Array(items) => items.iter_mut().for_each(normalize_flags),
        Value::Object(map) => map.values_mut().for_each(normalize_flags),
        _ => {}
    }
}

fn relay(r: &Relay) -> Value {
    json!({
        "id": r.id,
        "pin": r.pin,
        "man": r.manual,
        "stp": r.state,
        "out": r.is_output,
        "dig": r.is_digital,
        "lst": r.last_state,
        "dsc": r.label.as_str(),
        "isPwm": r.is_pwm,
        "pwm": r.pwm,
    })
}

fn sensor(s: &Sensor) -> Value {
    json!({
        "dsc": s.label.as_str(),
        "use": s.enabled,
        "sid": s.id,
        "rid": s.relay_id,
        "typ": s.type_mask.to_value(),
        "ser": s.series_ohms,
        "thm": s.thermistor_ohms,
    })
}

fn output(o: &OutputCommand) -> Value {
    json!({
        "use": o.enabled,
        "rid": o.relay_id,
        "stp": o.state,
        "lst": o.last_state,
        "rtn": o.return_on_clear,
        "isPwm": o.is_pwm,
        "pwm": o.pwm,
    })
}

fn action(a: &Action) -> Value {
    json!({
        "dsc": a.label.as_str(),
        "use": a.enabled,
        "trd": a.precondition_relay.unwrap_or(-1),
        "rmb": a.precondition_on,
        "tsd": a.sensor_id,
        "tvm": a.max,
        "tvi": a.min,
        "hum": a.use_humidity,
        "ame": a.more_or_equal,
        "irs": a.auto_return,
        "wtr": a.triggered,
        "msg": a.message.as_str(),
        "cls": a.options.to_value(),
        "outL": a.outputs.iter().map(output).collect::<Vec<_>>(),
    })
}

fn schedule(s: &ScheduleScenario) -> Value {
    json!({
        "use": s.enabled,
        "dsc": s.label.as_str(),
        "iac": s.active,
        "cls": s.options.to_value(),
        "sdt": s.start_date.as_str(),
        "edt": s.end_date.as_str(),
        "set": s.windows.iter()
            .map(|w| json!({"stm": w.start.as_str(), "etm": w.end.as_str()}))
            .collect::<Vec<_>>(),
        "wek": s.weekdays.to_value(),
        "mon": s.months.to_value(),
        "isr": output(&s.start),
        "esr": output(&s.end),
        "ltc": s.latches.to_array(),
    })
}

fn temperature(t: &TemperatureControl) -> Value {
    json!({
        "use": t.enabled,
        "rid": t.relay_id,
        "lst": t.last_state,
        "sid": t.sensor_id,
        "stT": t.target,
        "ctp": t.current,
        "smt": t.smoothing,
        "inc": t.heating,
        "cls": t.options.to_value(),
        "spi": t.pid_index,
    })
}

fn pid(p: &PidProfile) -> Value {
    json!({
        "dsc": p.label.as_str(),
        "Kp": p.kp,
        "Ki": p.ki,
        "Kd": p.kd,
    })
}

fn timer(t: &Timer) -> Value {
    json!({
        "use": t.enabled,
        "tim": t.duration.as_str(),
        "cls": t.options.to_value(),
        "isr": output(&t.start),
        "esr": output(&t.end),
    })
}
