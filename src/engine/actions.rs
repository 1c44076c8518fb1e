//! Step 2: sensor-triggered actions.
//!
//! Edge-triggered: effects fire once when the condition starts holding and
//! the `triggered` latch keeps them from firing again until it stops.

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::arbiter::{RuleRef, restore_relay_state, save_relay_state};
use crate::model::{Action, Device};

use super::apply_output;

/// Whether `reading` satisfies the action's comparison.
pub fn condition_holds(action: &Action, reading: f32) -> bool {
    if action.more_or_equal {
        reading >= action.min
    } else {
        reading < action.max
    }
}

/// `None` when the precondition relay is dangling.
fn precondition(device: &Device, action: &Action) -> Option<bool> {
    match action.precondition_relay {
        None => Some(true),
        Some(id) => device
            .relay(id)
            .map(|r| r.state == action.precondition_on),
    }
}

pub fn evaluate(device: &mut Device, sink: &mut impl EventSink) {
    for index in 0..device.actions.len() {
        let action = &device.actions[index];
        if !action.enabled {
            continue;
        }
        let Some(sensor) = device.sensor(action.sensor_id) else {
            continue;
        };
        let reading = if action.use_humidity {
            sensor.humidity_value
        } else {
            sensor.current_value
        };
        if reading.is_nan() {
            continue;
        }
        // A dangling precondition blocks firing but never clearing.
        let precondition_ok = precondition(device, action).unwrap_or(false);

        let holds = condition_holds(action, reading);
        if holds && !action.triggered && precondition_ok {
            fire(device, index, sink);
        } else if !holds && action.triggered {
            clear(device, index, sink);
        }
    }
}

fn fire(device: &mut Device, index: usize, sink: &mut impl EventSink) {
    let outputs = device.actions[index].outputs.clone();
    for cmd in outputs.iter().filter(|c| c.enabled) {
        save_relay_state(device, cmd.relay_id);
        apply_output(device, cmd);
    }
    let action = &mut device.actions[index];
    action.triggered = true;
    sink.emit(&AppEvent::ActionFired {
        label: action.label.clone(),
        message: action.message.clone(),
    });
}

fn clear(device: &mut Device, index: usize, sink: &mut impl EventSink) {
    let action = &device.actions[index];
    if action.auto_return {
        let returning: Vec<_> = action
            .outputs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled && c.return_on_clear)
            .map(|(o, c)| (o, c.relay_id))
            .collect();
        for (o, relay_id) in returning {
            restore_relay_state(device, relay_id, RuleRef::ActionOutput(index, o));
        }
    }
    let action = &mut device.actions[index];
    action.triggered = false;
    sink.emit(&AppEvent::ActionCleared {
        label: action.label.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutputCommand;
    use crate::store::factory::factory_device;

    #[derive(Default)]
    struct Events(Vec<AppEvent>);

    impl EventSink for Events {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    /// Action on sensor 7 driving relay 1 on, restoring on clear.
    fn device() -> Device {
        let mut d = factory_device();
        d.actions[0].outputs = vec![OutputCommand {
            return_on_clear: true,
            ..OutputCommand::new(1, true)
        }];
        d
    }

    fn step(d: &mut Device, value: f32, events: &mut Events) {
        d.sensor_mut(7).unwrap().current_value = value;
        evaluate(d, events);
    }

    #[test]
    fn fires_once_per_crossing() {
        let mut d = device();
        let mut ev = Events::default();
        let mut states = Vec::new();
        for v in [0.3, 0.6, 1.2, 0.4] {
            step(&mut d, v, &mut ev);
            states.push(d.relay(1).unwrap().state);
        }
        assert_eq!(states, vec![false, true, true, false]);
        assert_eq!(ev.0.len(), 2);
        assert!(matches!(ev.0[0], AppEvent::ActionFired { .. }));
        assert!(matches!(ev.0[1], AppEvent::ActionCleared { .. }));
    }

    #[test]
    fn no_restore_without_auto_return() {
        let mut d = device();
        d.actions[0].auto_return = false;
        let mut ev = Events::default();
        step(&mut d, 0.6, &mut ev);
        step(&mut d, 0.1, &mut ev);
        assert!(d.relay(1).unwrap().state, "relay stays where the action left it");
        assert!(!d.actions[0].triggered);
    }

    #[test]
    fn less_than_uses_max() {
        let mut d = device();
        d.actions[0].more_or_equal = false;
        assert!(condition_holds(&d.actions[0], 0.99));
        assert!(!condition_holds(&d.actions[0], 1.0));
        let mut ev = Events::default();
        step(&mut d, 0.2, &mut ev);
        assert!(d.actions[0].triggered);
    }

    #[test]
    fn precondition_gates_the_rising_edge() {
        let mut d = device();
        d.actions[0].precondition_relay = Some(3);
        d.actions[0].precondition_on = true;
        let mut ev = Events::default();
        step(&mut d, 0.6, &mut ev);
        assert!(!d.actions[0].triggered, "relay 3 is off");
        d.relay_mut(3).unwrap().state = true;
        step(&mut d, 0.7, &mut ev);
        assert!(d.actions[0].triggered);
    }

    #[test]
    fn nan_reading_is_not_an_edge() {
        let mut d = device();
        let mut ev = Events::default();
        step(&mut d, 0.6, &mut ev);
        step(&mut d, f32::NAN, &mut ev);
        assert!(d.actions[0].triggered);
        assert_eq!(ev.0.len(), 1);
    }

    #[test]
    fn dangling_references_make_the_action_inert() {
        let mut d = device();
        d.actions[0].sensor_id = 99;
        let mut ev = Events::default();
        step(&mut d, 0.6, &mut ev);
        assert!(ev.0.is_empty());

        let mut d = device();
        d.actions[0].precondition_relay = Some(42);
        step(&mut d, 0.6, &mut ev);
        assert!(ev.0.is_empty());
    }

    #[test]
    fn fired_action_clears_after_its_precondition_relay_is_gone() {
        let mut d = device();
        d.actions[0].precondition_relay = Some(3);
        d.actions[0].precondition_on = true;
        d.relay_mut(3).unwrap().state = true;
        let mut ev = Events::default();
        step(&mut d, 0.6, &mut ev);
        assert!(d.actions[0].triggered);
        assert!(d.relay(1).unwrap().state);

        d.relays.retain(|r| r.id != 3);
        step(&mut d, 0.2, &mut ev);
        assert!(!d.actions[0].triggered);
        assert!(!d.relay(1).unwrap().state, "restored to the pre-action level");
    }
}
