//! GPIO assignments for the factory-default board layout.
//!
//! Single source of truth for the pin numbers the default device is built
//! with.  User profiles may use any pin from [`usable_pins`].

// ---------------------------------------------------------------------------
// Relay outputs
// ---------------------------------------------------------------------------

/// Four relay driver channels, in board order.
pub const OUTPUT_GPIOS: [u8; 4] = [3, 18, 19, 21];

// ---------------------------------------------------------------------------
// Sensor inputs
// ---------------------------------------------------------------------------

/// DHT11 single-wire data line.
pub const CLIMATE_GPIO: u8 = 23;
/// Current transformer, analog via ADC1.
pub const CURRENT_ADC_GPIO: u8 = 33;

// ---------------------------------------------------------------------------
// Usable pin list
// ---------------------------------------------------------------------------

/// ESP32 pins safe for general I/O (flash and strapping-only pins excluded).
#[cfg(target_os = "espidf")]
const USABLE: &[u8] = &[
    0, 1, 2, 3, 4, 5, 12, 13, 14, 15, 16, 17, 18, 19, 21, 22, 23, 25, 26, 27, 32, 33,
];

/// Host simulation exposes a flat range.
#[cfg(not(target_os = "espidf"))]
const USABLE: &[u8] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21,
];

pub fn usable_pins() -> Vec<u8> {
    USABLE.to_vec()
}

/// Board identifier reported in the live status block.
#[cfg(target_os = "espidf")]
pub const BOARD: &str = "esp32";
#[cfg(not(target_os = "espidf"))]
pub const BOARD: &str = "host-sim";
