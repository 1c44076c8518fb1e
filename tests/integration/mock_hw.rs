//! Mock adapters for integration tests.
//!
//! Records every pin write and lets tests script sensor readings and the
//! clock without touching real GPIO/ADC registers.

use std::cell::Cell;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use relaymini::app::ports::{
    ClimateModel, ClimateReading, ClockPort, EventSink, PinPort, SensorPort, StorageError,
    StoragePort,
};
use relaymini::model::{Relay, RelayId};

// ── Pin write record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PinWrite {
    pub relay: RelayId,
    pub pin: u8,
    pub level: bool,
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub writes: Vec<PinWrite>,
    pub climate: HashMap<u8, ClimateReading>,
    pub analog: HashMap<u8, u16>,
    pub digital: HashMap<u8, bool>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level written for `relay`, if any.
    pub fn level_of(&self, relay: RelayId) -> Option<bool> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.relay == relay)
            .map(|w| w.level)
    }
}

impl SensorPort for MockHardware {
    fn read_climate(&mut self, pin: u8, _model: ClimateModel) -> Option<ClimateReading> {
        self.climate.get(&pin).copied()
    }

    fn read_analog(&mut self, pin: u8) -> Option<u16> {
        self.analog.get(&pin).copied()
    }

    fn read_digital(&mut self, pin: u8) -> Option<bool> {
        self.digital.get(&pin).copied()
    }
}

impl PinPort for MockHardware {
    fn write_pin(&mut self, relay: &Relay, level: bool) {
        self.writes.push(PinWrite {
            relay: relay.id,
            pin: relay.pin,
            level,
        });
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    pub store: HashMap<String, Vec<u8>>,
    pub writes: usize,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage already holding `data` under `namespace::key`.
    pub fn with_blob(namespace: &str, key: &str, data: &[u8]) -> Self {
        let mut nvs = Self::new();
        nvs.store.insert(format!("{}::{}", namespace, key), data.to_vec());
        nvs
    }

    pub fn blob(&self, namespace: &str, key: &str) -> Option<&Vec<u8>> {
        self.store.get(&format!("{}::{}", namespace, key))
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blob(namespace, key)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.store.insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── FixedClock ────────────────────────────────────────────────

/// Clock the test moves by hand.
pub struct FixedClock {
    pub now: Cell<Option<NaiveDateTime>>,
    pub uptime_ms: Cell<u64>,
}

#[allow(dead_code)]
impl FixedClock {
    pub fn unsynced() -> Self {
        Self {
            now: Cell::new(None),
            uptime_ms: Cell::new(0),
        }
    }

    pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Self {
        let clock = Self::unsynced();
        clock.set(y, mo, d, h, mi);
        clock
    }

    pub fn set(&self, y: i32, mo: u32, d: u32, h: u32, mi: u32) {
        let t = NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, 0))
            .expect("valid test date");
        self.now.set(Some(t));
    }

    pub fn advance_ms(&self, ms: u64) {
        self.uptime_ms.set(self.uptime_ms.get() + ms);
        if let Some(t) = self.now.get() {
            self.now
                .set(Some(t + chrono::Duration::milliseconds(ms as i64)));
        }
    }
}

impl ClockPort for FixedClock {
    fn now(&self) -> Option<NaiveDateTime> {
        self.now.get()
    }

    fn uptime_ms(&self) -> u64 {
        self.uptime_ms.get()
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<String>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &relaymini::app::events::AppEvent) {
        self.events.push(format!("{:?}", event));
    }
}
