//! DHT11 / DHT22 climate sensor on one open-drain line.
//!
//! The wire protocol is `dht_sensor`'s business; this module owns the pin,
//! maps the crate's readings into [`ClimateReading`] and rejects values
//! outside what the parts can physically report.

use dht_sensor::{DhtError, dht11, dht22};

use crate::app::ports::ClimateReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtFailure {
    /// The GPIO driver refused a level change or read.
    Pin,
    /// The sensor did not answer within the protocol window.
    Timeout,
    Checksum,
    /// Decoded values outside the sensor's physical range.
    OutOfRange,
}

impl DhtFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pin => "DHT line error",
            Self::Timeout => "DHT no response",
            Self::Checksum => "DHT checksum mismatch",
            Self::OutOfRange => "DHT reading out of range",
        }
    }
}

impl core::fmt::Display for DhtFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<E> From<DhtError<E>> for DhtFailure {
    fn from(e: DhtError<E>) -> Self {
        match e {
            DhtError::PinError(_) => Self::Pin,
            DhtError::ChecksumMismatch => Self::Checksum,
            #[allow(unreachable_patterns)]
            _ => Self::Timeout,
        }
    }
}

fn checked(celsius: f32, humidity: f32) -> Result<ClimateReading, DhtFailure> {
    if !(0.0..=100.0).contains(&humidity) || !(-40.0..=80.0).contains(&celsius) {
        return Err(DhtFailure::OutOfRange);
    }
    Ok(ClimateReading { celsius, humidity })
}

pub fn from_dht11(r: &dht11::Reading) -> Result<ClimateReading, DhtFailure> {
    checked(f32::from(r.temperature), f32::from(r.relative_humidity))
}

pub fn from_dht22(r: &dht22::Reading) -> Result<ClimateReading, DhtFailure> {
    checked(f32::from(r.temperature), f32::from(r.relative_humidity))
}

#[cfg(target_os = "espidf")]
pub use self::line::DhtLine;

#[cfg(target_os = "espidf")]
mod line {
    use dht_sensor::{dht11, dht22};
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyIOPin, InputOutput, PinDriver, Pull};

    use super::{DhtFailure, from_dht11, from_dht22};
    use crate::app::ports::{ClimateModel, ClimateReading};
    use crate::drivers::hw_init::HwInitError;

    /// An open-drain, pulled-up data line owned for the sensor's lifetime.
    pub struct DhtLine {
        pin: PinDriver<'static, AnyIOPin, InputOutput>,
        delay: Ets,
    }

    impl DhtLine {
        pub fn open(gpio: u8) -> Result<Self, HwInitError> {
            // SAFETY: the hardware adapter opens each sensor GPIO once and
            // never hands the same number to another driver.
            let pin = unsafe { AnyIOPin::new(i32::from(gpio)) };
            let config = |e: esp_idf_svc::sys::EspError| HwInitError::GpioConfigFailed(e.code());
            let mut pin = PinDriver::input_output_od(pin).map_err(config)?;
            pin.set_pull(Pull::Up).map_err(config)?;
            pin.set_high().map_err(config)?;
            Ok(Self { pin, delay: Ets })
        }

        pub fn read(&mut self, model: ClimateModel) -> Result<ClimateReading, DhtFailure> {
            self.pin.set_high().map_err(|_| DhtFailure::Pin)?;
            match model {
                ClimateModel::Dht11 => {
                    from_dht11(&dht11::blocking::read(&mut self.delay, &mut self.pin)?)
                }
                ClimateModel::Dht22 => {
                    from_dht22(&dht22::blocking::read(&mut self.delay, &mut self.pin)?)
                }
            }
        }
    }
}
