//! Relay output bank.
//!
//! Each relay pin is driven through an [`OutputPin`] line, configured the
//! first time it is written.  PWM relays claim one of the LEDC channels
//! instead; when all channels are taken the relay falls back to a plain
//! on/off level.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: lines write the GPIO register via `hw_init`.
//! On host/test: lines only remember their level.
//! Both targets keep the last written level for [`StatefulOutputPin`].

use std::collections::BTreeMap;

use embedded_hal::digital::{ErrorType, OutputPin, PinState, StatefulOutputPin};
use log::{info, warn};

use crate::drivers::hw_init;
use crate::model::Relay;

/// A single GPIO output line.
#[derive(Debug)]
pub struct GpioLine {
    gpio: u8,
    level: bool,
}

impl GpioLine {
    pub fn new(gpio: u8) -> Result<Self, hw_init::HwInitError> {
        hw_init::configure_output(gpio)?;
        Ok(Self {
            gpio,
            level: false,
        })
    }

    pub fn gpio(&self) -> u8 {
        self.gpio
    }
}

impl ErrorType for GpioLine {
    type Error = core::convert::Infallible;
}

impl OutputPin for GpioLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        #[cfg(target_os = "espidf")]
        hw_init::gpio_write(self.gpio, false);
        self.level = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        #[cfg(target_os = "espidf")]
        hw_init::gpio_write(self.gpio, true);
        self.level = true;
        Ok(())
    }
}

impl StatefulOutputPin for GpioLine {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    Digital(bool),
    Pwm(u8),
}

#[derive(Debug)]
enum Drive {
    Line(GpioLine),
    Ledc(u8),
}

#[derive(Debug)]
struct Channel {
    drive: Drive,
    level: OutputLevel,
}

/// All relay outputs the device has written so far, keyed by GPIO.
#[derive(Debug, Default)]
pub struct RelayBank {
    channels: BTreeMap<u8, Channel>,
    next_ledc: u8,
}

impl RelayBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive `relay.pin`.  A PWM relay outputs `relay.pwm` while `on`,
    /// duty 0 otherwise.
    pub fn write(&mut self, relay: &Relay, on: bool) {
        let wanted = if relay.is_pwm {
            OutputLevel::Pwm(if on { relay.pwm } else { 0 })
        } else {
            OutputLevel::Digital(on)
        };
        let Some(channel) = self.channel(relay.pin, relay.is_pwm) else {
            return;
        };
        if channel.level == wanted {
            return;
        }
        match (&mut channel.drive, wanted) {
            (Drive::Ledc(ch), OutputLevel::Pwm(duty)) => hw_init::ledc_set(*ch, duty),
            (Drive::Ledc(ch), OutputLevel::Digital(high)) => {
                hw_init::ledc_set(*ch, if high { u8::MAX } else { 0 });
            }
            (Drive::Line(line), OutputLevel::Pwm(duty)) => {
                let _ = line.set_state(PinState::from(duty > 0));
            }
            (Drive::Line(line), OutputLevel::Digital(high)) => {
                let _ = line.set_state(PinState::from(high));
            }
        }
        channel.level = wanted;
    }

    /// Last level written to `gpio`.
    pub fn level(&self, gpio: u8) -> Option<OutputLevel> {
        self.channels.get(&gpio).map(|c| c.level)
    }

    /// Every driven pin to off.
    pub fn all_off(&mut self) {
        for channel in self.channels.values_mut() {
            match &mut channel.drive {
                Drive::Ledc(ch) => hw_init::ledc_set(*ch, 0),
                Drive::Line(line) => {
                    let _ = line.set_low();
                }
            }
            channel.level = match channel.level {
                OutputLevel::Pwm(_) => OutputLevel::Pwm(0),
                OutputLevel::Digital(_) => OutputLevel::Digital(false),
            };
        }
    }

    fn channel(&mut self, gpio: u8, pwm: bool) -> Option<&mut Channel> {
        if !self.channels.contains_key(&gpio) {
            let channel = self.open(gpio, pwm)?;
            self.channels.insert(gpio, channel);
        }
        self.channels.get_mut(&gpio)
    }

    fn open(&mut self, gpio: u8, pwm: bool) -> Option<Channel> {
        if pwm && self.next_ledc < hw_init::LEDC_CHANNELS {
            match hw_init::ledc_attach(self.next_ledc, gpio) {
                Ok(()) => {
                    let ch = self.next_ledc;
                    self.next_ledc += 1;
                    info!("relay: GPIO{} on LEDC CH{}", gpio, ch);
                    return Some(Channel {
                        drive: Drive::Ledc(ch),
                        level: OutputLevel::Pwm(0),
                    });
                }
                Err(e) => warn!("relay: GPIO{} PWM attach failed: {}", gpio, e),
            }
        } else if pwm {
            warn!("relay: no LEDC channel left for GPIO{}, driving on/off", gpio);
        }
        match GpioLine::new(gpio) {
            Ok(line) => Some(Channel {
                drive: Drive::Line(line),
                level: OutputLevel::Digital(false),
            }),
            Err(e) => {
                warn!("relay: GPIO{} unusable: {}", gpio, e);
                None
            }
        }
    }
}
