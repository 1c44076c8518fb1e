//! Step 4: calendar schedules.
//!
//! A scenario matches when the date is inside `[start_date, end_date]`, the
//! weekday and month bits are set, and the time of day falls in any window.
//! Entry and exit each fire once per occurrence; the latches remember which
//! side effects were applied.

use chrono::NaiveDateTime;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::arbiter::{RuleRef, restore_relay_state, save_relay_state};
use crate::model::rules::{SCHEDULE_ARMS_TIMERS, SCHEDULE_ENGAGES_TEMPERATURE};
use crate::model::{Device, ScheduleLatches, ScheduleScenario};

use super::apply_output;
use super::calendar::{month_index, parse_date, parse_time_of_day, weekday_index, window_contains};

/// Whether `scenario` matches at `now`.  Malformed dates or times never
/// match.
pub fn matches(scenario: &ScheduleScenario, now: &NaiveDateTime) -> bool {
    let (Some(first), Some(last)) = (
        parse_date(&scenario.start_date),
        parse_date(&scenario.end_date),
    ) else {
        return false;
    };
    let today = now.date();
    if today < first || today > last {
        return false;
    }
    if !scenario.weekdays.get(weekday_index(now)) || !scenario.months.get(month_index(now)) {
        return false;
    }
    let t = now.time();
    scenario.windows.iter().any(|w| {
        match (parse_time_of_day(&w.start), parse_time_of_day(&w.end)) {
            (Some(start), Some(end)) => window_contains(start, end, t),
            _ => false,
        }
    })
}

pub fn evaluate(device: &mut Device, now: &NaiveDateTime, sink: &mut impl EventSink) {
    for index in 0..device.schedules.len() {
        let scenario = &mut device.schedules[index];
        if !scenario.enabled {
            scenario.active = false;
            scenario.latches = ScheduleLatches::default();
            continue;
        }

        let inside = matches(scenario, now);
        if inside && !scenario.latches.initial_applied {
            open(device, index);
            sink.emit(&AppEvent::ScheduleOpened {
                label: device.schedules[index].label.clone(),
            });
        } else if !inside && scenario.active {
            close(device, index);
            sink.emit(&AppEvent::ScheduleClosed {
                label: device.schedules[index].label.clone(),
            });
        }
    }
}

fn open(device: &mut Device, index: usize) {
    let scenario = &device.schedules[index];
    let cmd = scenario.start.clone();
    let engage_temperature = scenario.options.get(SCHEDULE_ENGAGES_TEMPERATURE);
    let arm_timers = scenario.options.get(SCHEDULE_ARMS_TIMERS);

    let end = &scenario.end;
    let save_end = end.enabled && end.return_on_clear && end.relay_id != cmd.relay_id;
    let end_relay = end.relay_id;

    if save_end {
        save_relay_state(device, end_relay);
    }
    if cmd.enabled {
        save_relay_state(device, cmd.relay_id);
        apply_output(device, &cmd);
    }
    if arm_timers {
        for timer in device.timers.iter_mut().filter(|t| t.enabled) {
            timer.rearm();
        }
    }

    let scenario = &mut device.schedules[index];
    scenario.active = true;
    scenario.latches = ScheduleLatches {
        initial_applied: true,
        end_applied: false,
        temperature_applied: engage_temperature,
        timers_applied: arm_timers,
    };
}

fn close(device: &mut Device, index: usize) {
    let cmd = device.schedules[index].end.clone();
    if cmd.enabled {
        if cmd.return_on_clear {
            restore_relay_state(device, cmd.relay_id, RuleRef::Schedule(index));
        } else {
            apply_output(device, &cmd);
        }
    }

    let scenario = &mut device.schedules[index];
    scenario.active = false;
    scenario.latches = ScheduleLatches {
        end_applied: true,
        ..ScheduleLatches::default()
    };
}

/// An open window currently asks for the temperature loop.
pub fn temperature_requested(device: &Device) -> bool {
    device.schedules_enabled
        && device
            .schedules
            .iter()
            .any(|s| s.enabled && s.active && s.latches.temperature_applied)
}
