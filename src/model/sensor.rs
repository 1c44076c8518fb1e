//! Sensor records.

use super::{Label, RelayId, SensorId};
use crate::bits::TypeMask;

/// Which read pipeline a sensor uses, chosen by the lowest set type bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Bit 0: DHT11-class temperature + humidity.
    Climate11,
    /// Bit 1: DHT22-class temperature + humidity.
    Climate22,
    /// Bit 2: NTC thermistor on an ADC pin.
    Thermistor,
    /// Bit 3: digital push button.
    Button,
    /// Bit 4: raw analog value.
    Analog,
}

impl SensorKind {
    pub const fn bit(self) -> usize {
        match self {
            Self::Climate11 => 0,
            Self::Climate22 => 1,
            Self::Thermistor => 2,
            Self::Button => 3,
            Self::Analog => 4,
        }
    }

    fn from_bit(bit: usize) -> Option<Self> {
        Some(match bit {
            0 => Self::Climate11,
            1 => Self::Climate22,
            2 => Self::Thermistor,
            3 => Self::Button,
            4 => Self::Analog,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sensor {
    pub id: SensorId,
    pub enabled: bool,
    /// Relay whose pin this sensor reads.
    pub relay_id: RelayId,
    pub type_mask: TypeMask,
    /// Divider resistor in ohms (`ser`).
    pub series_ohms: f32,
    /// Thermistor nominal resistance at 25 °C in ohms (`thm`).
    pub thermistor_ohms: f32,
    /// Primary reading; NaN after a failed read.
    pub current_value: f32,
    /// Humidity for climate sensors; NaN after a failed read.
    pub humidity_value: f32,
    pub label: Label,
}

impl Sensor {
    pub fn kind(&self) -> Option<SensorKind> {
        self.type_mask.first_set().and_then(SensorKind::from_bit)
    }

    pub fn with_kind(mut self, kind: SensorKind) -> Self {
        self.type_mask = TypeMask::empty();
        self.type_mask.set(kind.bit(), true);
        self
    }
}
