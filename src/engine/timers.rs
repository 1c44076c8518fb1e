//! Step 3: countdown timers.
//!
//! ```text
//!   armed ──start──▶ running ──remaining == 0──▶ stopped
//!     ▲                                             │
//!     └──────────── repeat flag / manual re-arm ────┘
//! ```
//!
//! A timer starts on the cycle it is found armed and counts the wall-clock
//! delta from the following cycle on.

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::arbiter::{RuleRef, restore_relay_state, save_relay_state};
use crate::model::{Device, TimerProgress};

use super::apply_output;
use super::calendar::parse_duration_ms;

pub fn advance(device: &mut Device, delta_ms: u32, sink: &mut impl EventSink) {
    for index in 0..device.timers.len() {
        let timer = &mut device.timers[index];
        if !timer.enabled {
            if timer.progress != TimerProgress::default() {
                timer.rearm();
            }
            continue;
        }
        let Some(duration) = parse_duration_ms(&timer.duration) else {
            continue;
        };

        if timer.is_armed() {
            start(device, index, duration);
            sink.emit(&AppEvent::TimerStarted { index });
            continue;
        }

        let progress = &mut device.timers[index].progress;
        if !progress.running {
            continue;
        }
        progress.elapsed_ms = progress.elapsed_ms.saturating_add(delta_ms).min(duration);
        progress.remaining_ms = duration - progress.elapsed_ms;
        if progress.remaining_ms == 0 {
            let rearmed = finish(device, index);
            sink.emit(&AppEvent::TimerFinished { index, rearmed });
        }
    }
}

fn start(device: &mut Device, index: usize, duration: u32) {
    let cmd = device.timers[index].start.clone();
    let end = &device.timers[index].end;
    if end.enabled && end.return_on_clear && end.relay_id != cmd.relay_id {
        save_relay_state(device, end.relay_id);
    }
    if cmd.enabled {
        save_relay_state(device, cmd.relay_id);
        apply_output(device, &cmd);
    }
    device.timers[index].progress = TimerProgress {
        elapsed_ms: 0,
        remaining_ms: duration,
        running: true,
        stopped: false,
    };
}

/// Returns whether the timer was re-armed.
fn finish(device: &mut Device, index: usize) -> bool {
    let cmd = device.timers[index].end.clone();
    if cmd.enabled {
        if cmd.return_on_clear {
            restore_relay_state(device, cmd.relay_id, RuleRef::Timer(index));
        } else {
            apply_output(device, &cmd);
        }
    }

    let repeat = device.timers_repeat;
    let timer = &mut device.timers[index];
    timer.progress.running = false;
    timer.progress.stopped = true;
    if repeat {
        timer.rearm();
    }
    repeat
}
