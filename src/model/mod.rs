//! Entity model: one [`Device`] profile and the records it owns.
//!
//! Cross-references between records (sensor → relay, action → sensor,
//! timer → relay, ...) always go through the numeric ids, never through a
//! collection position.  Collections are replaced wholesale by inbound
//! documents, so positions are not stable.

pub mod relay;
pub mod rules;
pub mod sensor;

pub use relay::{OutputCommand, Relay};
pub use rules::{
    Action, PidProfile, ScheduleLatches, ScheduleScenario, TemperatureControl, TimeWindow, Timer,
    TimerProgress,
};
pub use sensor::{Sensor, SensorKind};

/// Stable relay identity.
pub type RelayId = i32;
/// Stable sensor identity.
pub type SensorId = i32;

/// Labels: device name, relay/sensor/action/profile descriptions.
pub type Label = heapless::String<64>;
/// Free-text notification attached to an action.
pub type Message = heapless::String<128>;
/// `YYYY-MM-DD`.
pub type DateText = heapless::String<10>;
/// `HH:MM` or `HH:MM:SS`.
pub type TimeText = heapless::String<8>;

/// Build a bounded string from a literal known to fit.
pub(crate) fn text<const N: usize>(s: &str) -> heapless::String<N> {
    heapless::String::try_from(s).unwrap_or_default()
}

/// One automation profile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Device {
    pub name: Label,
    pub selected: bool,
    pub pins: Vec<u8>,
    pub relays: Vec<Relay>,
    pub sensors: Vec<Sensor>,
    pub actions: Vec<Action>,
    pub schedules: Vec<ScheduleScenario>,
    pub timers: Vec<Timer>,
    pub pids: Vec<PidProfile>,
    pub temperature: TemperatureControl,
    /// `ite`
    pub timers_enabled: bool,
    /// `iet`: re-arm timers after they finish.
    pub timers_repeat: bool,
    /// `ise`
    pub schedules_enabled: bool,
    /// `iae`
    pub actions_enabled: bool,
}

impl Device {
    pub fn relay(&self, id: RelayId) -> Option<&Relay> {
        self.relays.iter().find(|r| r.id == id)
    }

    pub fn relay_mut(&mut self, id: RelayId) -> Option<&mut Relay> {
        self.relays.iter_mut().find(|r| r.id == id)
    }

    pub fn sensor(&self, id: SensorId) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.id == id)
    }

    pub fn sensor_mut(&mut self, id: SensorId) -> Option<&mut Sensor> {
        self.sensors.iter_mut().find(|s| s.id == id)
    }

    pub fn output_relays(&self) -> impl Iterator<Item = &Relay> {
        self.relays.iter().filter(|r| r.is_output)
    }

    /// Selected PID profile, falling back to the first one when the index
    /// is out of range.
    pub fn pid_profile(&self) -> Option<&PidProfile> {
        self.pids
            .get(usize::from(self.temperature.pid_index))
            .or_else(|| self.pids.first())
    }

    /// Reset every transient field to its construction-time value.
    ///
    /// Used when a profile is hydrated from storage: progress counters and
    /// live readings never come from the document.
    pub fn clear_runtime(&mut self) {
        for t in &mut self.timers {
            t.progress = TimerProgress::default();
        }
        for s in &mut self.sensors {
            s.current_value = 0.0;
            s.humidity_value = 0.0;
        }
        self.temperature.engaged = false;
        self.temperature.output_ms = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_with_relays(ids: &[RelayId]) -> Device {
        Device {
            relays: ids
                .iter()
                .map(|&id| Relay {
                    id,
                    is_output: id % 2 == 0,
                    ..Relay::default()
                })
                .collect(),
            ..Device::default()
        }
    }

    #[test]
    fn lookup_is_by_id_not_position() {
        let d = device_with_relays(&[7, 3, 12]);
        assert_eq!(d.relay(3).map(|r| r.id), Some(3));
        assert!(d.relay(1).is_none(), "position 1 must not resolve");
    }

    #[test]
    fn output_relays_filters_direction() {
        let d = device_with_relays(&[1, 2, 4]);
        let ids: Vec<_> = d.output_relays().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn pid_profile_falls_back_to_first() {
        let mut d = Device::default();
        d.pids.push(PidProfile::new("Standard", 2.0, 0.5, 1.0));
        d.temperature.pid_index = 9;
        assert_eq!(d.pid_profile().map(|p| p.kp), Some(2.0));
    }
}
