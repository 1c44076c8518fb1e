//! Step 1: sensor read.
//!
//! Split in three so hardware reads can run outside the state lock:
//! [`read_plan`] snapshots what to read, [`read_samples`] talks to the
//! port, [`store_samples`] writes the results back by sensor id.

use core::fmt::Write as _;

use crate::app::ports::{ClimateModel, SensorPort};
use crate::model::{Device, SensorId, SensorKind};
use crate::sensors::thermistor;

/// What to read for one enabled sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedRead {
    pub sensor_id: SensorId,
    /// `None` when the type mask selects nothing known.
    pub kind: Option<SensorKind>,
    /// `None` when the sensor's relay id is dangling.
    pub pin: Option<u8>,
    pub series_ohms: f32,
    pub thermistor_ohms: f32,
}

/// Result of one planned read.  NaN marks a failed read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub sensor_id: SensorId,
    pub value: f32,
    /// Only climate sensors report humidity.
    pub humidity: Option<f32>,
}

pub fn read_plan(device: &Device) -> Vec<PlannedRead> {
    device
        .sensors
        .iter()
        .filter(|s| s.enabled)
        .map(|s| PlannedRead {
            sensor_id: s.id,
            kind: s.kind(),
            pin: device.relay(s.relay_id).map(|r| r.pin),
            series_ohms: s.series_ohms,
            thermistor_ohms: s.thermistor_ohms,
        })
        .collect()
}

pub fn read_samples(plan: &[PlannedRead], hw: &mut impl SensorPort) -> Vec<SensorSample> {
    plan.iter().map(|p| read_one(p, hw)).collect()
}

fn read_one(item: &PlannedRead, hw: &mut impl SensorPort) -> SensorSample {
    let failed = |humidity: bool| SensorSample {
        sensor_id: item.sensor_id,
        value: f32::NAN,
        humidity: humidity.then_some(f32::NAN),
    };
    let (Some(kind), Some(pin)) = (item.kind, item.pin) else {
        return failed(false);
    };

    let mut climate = |model| match hw.read_climate(pin, model) {
        Some(r) if r.celsius.is_finite() && r.humidity.is_finite() => SensorSample {
            sensor_id: item.sensor_id,
            value: r.celsius,
            humidity: Some(r.humidity),
        },
        _ => failed(true),
    };

    let value = match kind {
        SensorKind::Climate11 => return climate(ClimateModel::Dht11),
        SensorKind::Climate22 => return climate(ClimateModel::Dht22),
        SensorKind::Thermistor => hw.read_analog(pin).and_then(|raw| {
            thermistor::adc_to_celsius(raw, item.series_ohms, item.thermistor_ohms)
        }),
        SensorKind::Button => hw
            .read_digital(pin)
            .map(|pressed| if pressed { 1.0 } else { 0.0 }),
        SensorKind::Analog => hw.read_analog(pin).map(f32::from),
    };

    SensorSample {
        sensor_id: item.sensor_id,
        value: value.unwrap_or(f32::NAN),
        humidity: None,
    }
}

/// Write samples into the matching sensors.  Unknown ids are skipped.
pub fn store_samples(device: &mut Device, samples: &[SensorSample]) {
    for sample in samples {
        if let Some(sensor) = device.sensor_mut(sample.sensor_id) {
            sensor.current_value = sample.value;
            if let Some(h) = sample.humidity {
                sensor.humidity_value = h;
            }
        }
    }
}

/// One line per enabled sensor, for logs and the status page.
pub fn summary(device: &Device) -> String {
    let mut out = String::new();
    for s in device.sensors.iter().filter(|s| s.enabled) {
        let _ = write!(out, "{}: ", s.label);
        let v = s.current_value;
        if v.is_nan() {
            out.push_str("error");
        } else {
            let _ = match s.kind() {
                Some(SensorKind::Climate11 | SensorKind::Climate22) => {
                    write!(out, "T={:.1}°C H={:.1}%", v, s.humidity_value)
                }
                Some(SensorKind::Thermistor) => write!(out, "NTC={:.1}°C", v),
                Some(SensorKind::Button) => {
                    out.push_str(if v > 0.5 { "pressed" } else { "released" });
                    Ok(())
                }
                Some(SensorKind::Analog) => write!(out, "analog={:.0}", v),
                None => write!(out, "unknown type"),
            };
        }
        out.push('\n');
    }
    out
}
