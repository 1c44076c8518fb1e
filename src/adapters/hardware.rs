//! Hardware adapter: bridges pins and sensors to the domain port traits.
//!
//! Owns the [`RelayBank`] and implements [`SensorPort`] and [`PinPort`].
//! This is the only module that touches real hardware.  On non-espidf
//! targets sensor reads come from an in-memory table the caller fills in,
//! which is what the host simulation and tests drive.

use std::collections::{BTreeSet, HashMap};

use log::{debug, warn};

use crate::app::ports::{ClimateModel, ClimateReading, PinPort, SensorPort};
use crate::drivers::hw_init;
use crate::drivers::relay_bank::{OutputLevel, RelayBank};
use crate::model::Relay;

/// Values the host build reports from its "sensors".
#[derive(Debug, Default)]
#[cfg_attr(target_os = "espidf", allow(dead_code))]
pub struct SimInputs {
    climate: HashMap<u8, ClimateReading>,
    analog: HashMap<u8, u16>,
    digital: HashMap<u8, bool>,
}

impl SimInputs {
    pub fn set_climate(&mut self, pin: u8, reading: Option<ClimateReading>) {
        match reading {
            Some(r) => self.climate.insert(pin, r),
            None => self.climate.remove(&pin),
        };
    }

    pub fn set_analog(&mut self, pin: u8, raw: Option<u16>) {
        match raw {
            Some(v) => self.analog.insert(pin, v),
            None => self.analog.remove(&pin),
        };
    }

    pub fn set_digital(&mut self, pin: u8, level: Option<bool>) {
        match level {
            Some(v) => self.digital.insert(pin, v),
            None => self.digital.remove(&pin),
        };
    }
}

#[derive(Default)]
pub struct HardwareAdapter {
    relays: RelayBank,
    inputs_configured: BTreeSet<u8>,
    #[cfg(target_os = "espidf")]
    climate_lines: std::collections::BTreeMap<u8, crate::drivers::dht::DhtLine>,
    sim: SimInputs,
}

impl HardwareAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated sensor values (ignored by the ESP-IDF build).
    pub fn sim_mut(&mut self) -> &mut SimInputs {
        &mut self.sim
    }

    /// Last level driven onto `pin`.
    pub fn output_level(&self, pin: u8) -> Option<OutputLevel> {
        self.relays.level(pin)
    }

    /// Drop every relay output (used before restart).
    pub fn all_off(&mut self) {
        self.relays.all_off();
    }

    fn ensure_input(&mut self, pin: u8) -> bool {
        if self.inputs_configured.contains(&pin) {
            return true;
        }
        match hw_init::configure_input(pin) {
            Ok(()) => {
                self.inputs_configured.insert(pin);
                true
            }
            Err(e) => {
                warn!("sensor: GPIO{} input config failed: {}", pin, e);
                false
            }
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn read_climate(&mut self, pin: u8, model: ClimateModel) -> Option<ClimateReading> {
        use crate::drivers::dht::DhtLine;

        if !self.climate_lines.contains_key(&pin) {
            match DhtLine::open(pin) {
                Ok(line) => {
                    self.climate_lines.insert(pin, line);
                }
                Err(e) => {
                    warn!("sensor: GPIO{} climate line: {}", pin, e);
                    return None;
                }
            }
        }
        let line = self.climate_lines.get_mut(&pin)?;
        match line.read(model) {
            Ok(reading) => Some(reading),
            Err(e) => {
                debug!("{:?} on GPIO{}: {}", model, pin, crate::Error::from(e));
                None
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_climate(&mut self, pin: u8, model: ClimateModel) -> Option<ClimateReading> {
        let reading = self.sim.climate.get(&pin).copied();
        if reading.is_none() {
            debug!("sensor(sim): no {:?} reading on GPIO{}", model, pin);
        }
        reading
    }

    fn read_analog(&mut self, pin: u8) -> Option<u16> {
        if hw_init::adc1_channel(pin).is_none() {
            debug!("sensor: GPIO{} has no ADC1 channel", pin);
            return None;
        }
        #[cfg(target_os = "espidf")]
        {
            hw_init::adc_read(pin)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.analog.get(&pin).copied()
        }
    }

    fn read_digital(&mut self, pin: u8) -> Option<bool> {
        if !self.ensure_input(pin) {
            return None;
        }
        #[cfg(target_os = "espidf")]
        {
            Some(hw_init::gpio_read(pin))
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.digital.get(&pin).copied()
        }
    }
}

// ── PinPort implementation ────────────────────────────────────

impl PinPort for HardwareAdapter {
    fn write_pin(&mut self, relay: &Relay, level: bool) {
        #[cfg(target_os = "espidf")]
        self.climate_lines.remove(&relay.pin);
        if self.inputs_configured.remove(&relay.pin) {
            warn!("relay {}: GPIO{} was an input, switching to output", relay.id, relay.pin);
        }
        self.relays.write(relay, level);
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn simulated_reads_come_from_the_input_table() {
        let mut hw = HardwareAdapter::new();
        assert_eq!(hw.read_analog(33), None);
        hw.sim_mut().set_analog(33, Some(2048));
        assert_eq!(hw.read_analog(33), Some(2048));

        hw.sim_mut().set_digital(4, Some(true));
        assert_eq!(hw.read_digital(4), Some(true));

        let reading = ClimateReading {
            celsius: 21.5,
            humidity: 40.0,
        };
        hw.sim_mut().set_climate(23, Some(reading));
        assert_eq!(hw.read_climate(23, ClimateModel::Dht11), Some(reading));
        hw.sim_mut().set_climate(23, None);
        assert_eq!(hw.read_climate(23, ClimateModel::Dht11), None);
    }

    #[test]
    fn analog_needs_an_adc1_pin() {
        let mut hw = HardwareAdapter::new();
        hw.sim_mut().set_analog(25, Some(100));
        assert_eq!(hw.read_analog(25), None);
    }

    #[test]
    fn written_relays_are_visible() {
        let mut hw = HardwareAdapter::new();
        let relay = Relay {
            id: 0,
            pin: 18,
            is_output: true,
            ..Relay::default()
        };
        hw.write_pin(&relay, true);
        assert_eq!(hw.output_level(18), Some(OutputLevel::Digital(true)));
        hw.all_off();
        assert_eq!(hw.output_level(18), Some(OutputLevel::Digital(false)));
    }
}
