//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerService / RuleEngine (domain)
//! ```
//!
//! Driven adapters (sensors, relay pins, clock, storage, event sinks)
//! implement these traits.  The domain consumes them via generics, so the
//! rule engine never touches hardware directly.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **StoragePort** writes MUST be atomic: a reader sees the old blob or
//!   the new one, never a mix.  Timeouts are the adapter's business.

use chrono::NaiveDateTime;

use crate::config::ControllerConfig;
use crate::model::Relay;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature and relative humidity from a single-wire climate sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub celsius: f32,
    pub humidity: f32,
}

/// Which climate sensor protocol variant to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateModel {
    Dht11,
    Dht22,
}

/// Raw reads, one per sensor pipeline.  `None` means the read failed.
pub trait SensorPort {
    fn read_climate(&mut self, pin: u8, model: ClimateModel) -> Option<ClimateReading>;

    /// 12-bit ADC sample.
    fn read_analog(&mut self, pin: u8) -> Option<u16>;

    fn read_digital(&mut self, pin: u8) -> Option<bool>;
}

// ───────────────────────────────────────────────────────────────
// Pin port (driven adapter: domain → relay outputs)
// ───────────────────────────────────────────────────────────────

pub trait PinPort {
    /// Drive `relay.pin` to `level`.  PWM relays may use `relay.pwm`.
    fn write_pin(&mut self, relay: &Relay, level: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Local wall-clock time, `None` until the clock is trustworthy.
    fn now(&self) -> Option<NaiveDateTime>;

    /// Monotonic milliseconds since boot.
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Invalid values are rejected with [`ConfigError::ValidationFailed`],
/// never clamped.
pub trait ConfigPort {
    /// Returns [`ControllerConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<ControllerConfig, ConfigError>;

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced blob storage.
pub trait StoragePort {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace the blob atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    StorageFull,
    IoError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
    /// Blob exceeds what the backend can hold in one entry.
    TooLarge,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::TooLarge => write!(f, "blob too large"),
        }
    }
}
