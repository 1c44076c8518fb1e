//! Factory-default device.
//!
//! Built at first boot, after a factory reset, and as the in-memory fallback
//! when the stored document cannot be decoded.

use crate::bits::{MonthMask, OptionMask, WeekMask};
use crate::model::{
    Action, Device, OutputCommand, PidProfile, Relay, ScheduleScenario, Sensor, SensorKind,
    TemperatureControl, TimeWindow, Timer, text,
};
use crate::pins;

const MANUAL: [bool; 4] = [true, false, true, false];
const STATE: [bool; 4] = [true, false, true, false];

const CLIMATE_RELAY: i32 = 4;
const CURRENT_RELAY: i32 = 5;
const CLIMATE_SENSOR: i32 = 6;
const CURRENT_SENSOR: i32 = 7;

fn option(bit: usize) -> OptionMask {
    let mut m = OptionMask::empty();
    m.set(bit, true);
    m
}

pub fn factory_device() -> Device {
    let mut relays: Vec<Relay> = pins::OUTPUT_GPIOS
        .iter()
        .enumerate()
        .map(|(i, &pin)| {
            let mut label = crate::model::Label::new();
            // "Output N" always fits the label capacity.
            let _ = core::fmt::write(&mut label, format_args!("Output {}", i + 1));
            Relay {
                id: i as i32,
                pin,
                is_output: true,
                is_digital: true,
                manual: MANUAL[i],
                state: STATE[i],
                label,
                ..Relay::default()
            }
        })
        .collect();
    relays.push(Relay {
        id: CLIMATE_RELAY,
        pin: pins::CLIMATE_GPIO,
        is_digital: true,
        label: text("DHT-11 input"),
        ..Relay::default()
    });
    relays.push(Relay {
        id: CURRENT_RELAY,
        pin: pins::CURRENT_ADC_GPIO,
        label: text("Current sensor input"),
        ..Relay::default()
    });

    let sensors = vec![
        Sensor {
            id: CLIMATE_SENSOR,
            enabled: true,
            relay_id: CLIMATE_RELAY,
            series_ohms: 20_000.0,
            thermistor_ohms: 10_000.0,
            label: text("DHT11 sensor"),
            ..Sensor::default()
        }
        .with_kind(SensorKind::Climate11),
        Sensor {
            id: CURRENT_SENSOR,
            enabled: true,
            relay_id: CURRENT_RELAY,
            series_ohms: 20_000.0,
            thermistor_ohms: 10_000.0,
            label: text("Current sensor"),
            ..Sensor::default()
        }
        .with_kind(SensorKind::Analog),
    ];

    let overcurrent = Action {
        label: text("Overcurrent"),
        enabled: true,
        precondition_relay: None,
        precondition_on: true,
        sensor_id: CURRENT_SENSOR,
        max: 1.0,
        min: 0.5,
        use_humidity: false,
        more_or_equal: true,
        auto_return: true,
        triggered: false,
        message: crate::model::Message::new(),
        options: option(1),
        outputs: vec![OutputCommand {
            return_on_clear: true,
            ..OutputCommand::new(0, false)
        }],
    };

    let scenario = ScheduleScenario {
        label: text("My first scenario 1"),
        enabled: false,
        active: false,
        options: option(3),
        start_date: text("2012-12-12"),
        end_date: text("2222-12-12"),
        windows: vec![TimeWindow::new("08:00", "18:00")],
        weekdays: WeekMask::all(),
        months: MonthMask::all(),
        start: OutputCommand::new(0, true),
        end: OutputCommand {
            enabled: false,
            ..OutputCommand::new(0, false)
        },
        ..ScheduleScenario::default()
    };

    let timer = Timer {
        enabled: true,
        duration: text("00:00:05"),
        options: option(1),
        start: OutputCommand::new(0, true),
        end: OutputCommand::new(0, false),
        ..Timer::default()
    };

    Device {
        name: text("MyDevice1"),
        selected: true,
        pins: pins::usable_pins(),
        relays,
        sensors,
        actions: vec![overcurrent],
        schedules: vec![scenario],
        timers: vec![timer],
        pids: vec![
            PidProfile::new("Standard", 2.0, 0.5, 1.0),
            PidProfile::new("Fast", 1.5, 0.4, 0.9),
            PidProfile::new("Smooth", 1.0, 0.3, 0.8),
        ],
        temperature: TemperatureControl {
            enabled: false,
            relay_id: 0,
            sensor_id: CLIMATE_SENSOR,
            target: 22.0,
            heating: true,
            options: option(0),
            pid_index: 0,
            ..TemperatureControl::default()
        },
        timers_enabled: false,
        timers_repeat: true,
        schedules_enabled: false,
        actions_enabled: false,
    }
}
