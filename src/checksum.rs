//! Change-detection hashes.
//!
//! Four independent DJB2 accumulators (`h = h * 33 + byte`, seed 5381), one
//! per observable slice of the active device.  A poller compares them with
//! the values it last sent and re-serializes only the slices that moved.
//!
//! These are not integrity checks.  Collisions only cost a missed or extra
//! update.

use core::hash::Hasher;

use crate::model::Device;

const SEED: u32 = 5381;

/// DJB2 over a byte stream.  Multi-byte values are fed little-endian so the
/// result does not depend on the target.
#[derive(Debug, Clone, Copy)]
pub struct Djb2 {
    hash: u32,
}

impl Default for Djb2 {
    fn default() -> Self {
        Self { hash: SEED }
    }
}

impl Djb2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u32 {
        self.hash
    }

    fn bool(&mut self, b: bool) {
        self.write_u8(u8::from(b));
    }

    fn i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.write(&v.to_le_bytes());
    }
}

impl Hasher for Djb2 {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash = self.hash.wrapping_mul(33).wrapping_add(u32::from(b));
        }
    }

    fn finish(&self) -> u64 {
        u64::from(self.hash)
    }
}

/// One hash per slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeHashes {
    pub flags: u32,
    pub relays: u32,
    pub sensors: u32,
    pub timers: u32,
}

impl ChangeHashes {
    pub fn compute(device: &Device) -> Self {
        Self {
            flags: flags_hash(device),
            relays: relays_hash(device),
            sensors: sensors_hash(device),
            timers: timers_hash(device),
        }
    }
}

/// Name, selection, the four feature flags and the temperature enable.
pub fn flags_hash(device: &Device) -> u32 {
    let mut h = Djb2::new();
    h.write(device.name.as_bytes());
    h.bool(device.selected);
    h.bool(device.timers_enabled);
    h.bool(device.timers_repeat);
    h.bool(device.schedules_enabled);
    h.bool(device.actions_enabled);
    h.bool(device.temperature.enabled);
    h.value()
}

pub fn relays_hash(device: &Device) -> u32 {
    let mut h = Djb2::new();
    for r in device.output_relays() {
        h.i32(r.id);
        h.write_u8(r.pin);
        h.bool(r.is_output);
        h.bool(r.is_digital);
        h.bool(r.is_pwm);
        h.write_u8(r.pwm);
        h.bool(r.manual);
        h.write(r.label.as_bytes());
        h.bool(r.state);
    }
    h.value()
}

/// Only the two live readings of enabled sensors.
pub fn sensors_hash(device: &Device) -> u32 {
    let mut h = Djb2::new();
    for s in device.sensors.iter().filter(|s| s.enabled) {
        h.f32(s.current_value);
        h.f32(s.humidity_value);
    }
    h.value()
}

pub fn timers_hash(device: &Device) -> u32 {
    let mut h = Djb2::new();
    for t in device.timers.iter().filter(|t| t.enabled) {
        h.u32(t.progress.elapsed_ms);
        h.u32(t.progress.remaining_ms);
        h.bool(t.progress.running);
        h.bool(t.progress.stopped);
    }
    h.value()
}

/// Persisted fields the rule engine writes: relay levels, the save/restore
/// caches and the action and schedule latches.  Not a live slice; the
/// service compares it across a cycle to learn that the store went stale.
pub fn rule_state_hash(device: &Device) -> u32 {
    let mut h = Djb2::new();
    for r in &device.relays {
        h.bool(r.state);
        h.bool(r.last_state);
        h.write_u8(r.pwm);
    }
    for a in &device.actions {
        h.bool(a.triggered);
        for o in &a.outputs {
            h.bool(o.last_state);
        }
    }
    for s in &device.schedules {
        h.bool(s.active);
        for latch in s.latches.to_array() {
            h.bool(latch);
        }
        h.bool(s.start.last_state);
        h.bool(s.end.last_state);
    }
    for t in &device.timers {
        h.bool(t.start.last_state);
        h.bool(t.end.last_state);
    }
    h.bool(device.temperature.last_state);
    h.value()
}
