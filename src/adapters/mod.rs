//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | SensorPort   | ESP32 ADC1, GPIO, DHT line     |
//! |            | PinPort      | ESP32 GPIO, LEDC PWM           |
//! | `log_sink` | EventSink    | Serial log output              |
//! | `nvs`      | ConfigPort   | NVS / in-memory store          |
//! |            | StoragePort  |                                |
//! | `time`     | ClockPort    | ESP32 system timer + RTC       |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
