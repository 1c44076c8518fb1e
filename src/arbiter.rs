//! Relay save/restore.
//!
//! A rule that drives a relay away from its home level first saves the
//! current level.  The level is copied into the relay's own `last_state` and
//! into the cache of every *idle* rule record that references the relay.
//! Records that are already holding the relay keep the level they captured
//! when they took it, so each rule can later restore exactly what it found.
//!
//! ```text
//!   timer starts   save → timer.cache = false    relay := true
//!   window opens   save → sched.cache = true     (timer busy, untouched)
//!   timer ends     restore(timer) → relay := false
//! ```

use crate::model::{Device, OutputCommand, RelayId};

/// The rule record whose cache a restore should read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleRef {
    Temperature,
    Timer(usize),
    Schedule(usize),
    /// `(action, output)` positions.
    ActionOutput(usize, usize),
}

/// Capture the current level of `relay_id`.
///
/// A missing relay is captured as `false`.
pub fn save_relay_state(device: &mut Device, relay_id: RelayId) {
    let level = match device.relay_mut(relay_id) {
        Some(relay) => {
            relay.last_state = relay.state;
            relay.state
        }
        None => false,
    };

    let temp = &mut device.temperature;
    if temp.relay_id == relay_id && !temp.engaged {
        temp.last_state = level;
    }

    for timer in device.timers.iter_mut().filter(|t| !t.progress.running) {
        for cmd in [&mut timer.start, &mut timer.end] {
            if cmd.relay_id == relay_id {
                cmd.last_state = level;
            }
        }
    }

    for sched in device
        .schedules
        .iter_mut()
        .filter(|s| !s.latches.initial_applied)
    {
        for cmd in [&mut sched.start, &mut sched.end] {
            if cmd.relay_id == relay_id {
                cmd.last_state = level;
            }
        }
    }

    for action in device.actions.iter_mut().filter(|a| !a.triggered) {
        for cmd in action.outputs.iter_mut().filter(|o| o.relay_id == relay_id) {
            cmd.last_state = level;
        }
    }
}

/// Write `rule`'s cached level back to `relay_id`.
///
/// Returns `false` (and changes nothing) when the relay or the rule record
/// no longer exists.
pub fn restore_relay_state(device: &mut Device, relay_id: RelayId, rule: RuleRef) -> bool {
    let cached = match rule {
        RuleRef::Temperature => Some(device.temperature.last_state),
        RuleRef::Timer(i) => device
            .timers
            .get(i)
            .and_then(|t| cache_for(relay_id, [&t.start, &t.end])),
        RuleRef::Schedule(i) => device
            .schedules
            .get(i)
            .and_then(|s| cache_for(relay_id, [&s.start, &s.end])),
        RuleRef::ActionOutput(a, o) => device
            .actions
            .get(a)
            .and_then(|a| a.outputs.get(o))
            .map(|o| o.last_state),
    };
    match (cached, device.relay_mut(relay_id)) {
        (Some(level), Some(relay)) => {
            relay.state = level;
            true
        }
        _ => false,
    }
}

/// Cache of the first command in `cmds` that drives `relay_id`.
fn cache_for(relay_id: RelayId, cmds: [&OutputCommand; 2]) -> Option<bool> {
    cmds.into_iter()
        .find(|c| c.relay_id == relay_id)
        .map(|c| c.last_state)
}
