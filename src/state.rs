//! Shared application state.
//!
//! The active [`Device`] is the one mutable resource the control cycle,
//! inbound configuration writes and outbound snapshots all touch.  It lives
//! behind a [`ControllerHandle`]: a cloneable handle over a blocking mutex
//! whose critical sections are kept short.  Parsing and validation happen
//! before the lock is taken, so a writer only ever moves finished values in.
//!
//! ```text
//!   transport ──┐                             ┌── ControllerService::tick
//!               ▼                             ▼
//!        ControllerHandle ── lock ── RefCell<AppState>
//! ```

use std::cell::RefCell;
use std::sync::Arc;

use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde_json::Value;

use crate::checksum::ChangeHashes;
use crate::codec::{self, DevicePatch};
use crate::config::ControllerConfig;
use crate::engine::sensors;
use crate::error::{Error, Result};
use crate::live::{self, ChangeTracker, SliceKind, StaticInfo};
use crate::model::{Device, RelayId};
use crate::relay_cmd::{self, RelayAction};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything behind the lock.
#[derive(Debug)]
pub struct AppState {
    pub device: Device,
    /// Raw documents of every stored profile.  The active slot is refreshed
    /// from `device` whenever the store is encoded.
    profiles: Vec<Value>,
    active_index: usize,
    /// Bumped by every mutation that should reach flash.
    revision: u64,
    saved_revision: u64,
    dirty_since_ms: u64,
    uptime_ms: u64,
    now: Option<NaiveDateTime>,
}

impl AppState {
    pub fn new(device: Device, profiles: Vec<Value>, active_index: usize) -> Self {
        Self {
            device,
            profiles,
            active_index,
            revision: 0,
            saved_revision: 0,
            dirty_since_ms: 0,
            uptime_ms: 0,
            now: None,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len().max(1)
    }

    /// Record the clock sample of the current cycle.
    pub fn set_clock(&mut self, uptime_ms: u64, now: Option<NaiveDateTime>) {
        self.uptime_ms = uptime_ms;
        self.now = now;
    }

    pub fn static_info(&self) -> StaticInfo {
        StaticInfo {
            uptime_ms: self.uptime_ms,
            now: self.now,
        }
    }

    // ── Dirty tracking ────────────────────────────────────────

    pub fn mark_dirty(&mut self) {
        if !self.is_dirty() {
            self.dirty_since_ms = self.uptime_ms;
        }
        self.revision += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn dirty_since_ms(&self) -> Option<u64> {
        self.is_dirty().then_some(self.dirty_since_ms)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mark `revision` as persisted.  Changes made after it was encoded
    /// stay dirty.
    pub fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = self.saved_revision.max(revision);
    }

    // ── Documents ─────────────────────────────────────────────

    /// The full store document: every profile, the active one re-encoded.
    pub fn store_document(&self) -> Value {
        let active = codec::encode_device(&self.device);
        let mut profiles = self.profiles.clone();
        match profiles.get_mut(self.active_index) {
            Some(slot) => *slot = active,
            None => profiles.push(active),
        }
        codec::join_profiles(profiles)
    }

    /// Swap in a freshly booted store.
    pub fn replace(&mut self, device: Device, profiles: Vec<Value>, active_index: usize) {
        self.device = device;
        self.profiles = profiles;
        self.active_index = active_index;
        self.saved_revision = self.revision;
    }
}

// ---------------------------------------------------------------------------
// ControllerHandle
// ---------------------------------------------------------------------------

type Shared = Mutex<CriticalSectionRawMutex, RefCell<AppState>>;

/// Cloneable handle to the shared state.  All transport-facing operations
/// are methods here.
#[derive(Clone)]
pub struct ControllerHandle {
    inner: Arc<Shared>,
    upload_limit: usize,
}

impl ControllerHandle {
    pub fn new(state: AppState, config: &ControllerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RefCell::new(state))),
            upload_limit: config.upload_limit(),
        }
    }

    /// Run `f` inside the critical section.
    ///
    /// `f` must not call back into the handle.
    pub fn with<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Snapshot of the active device.
    pub fn active_device(&self) -> Device {
        self.with(|s| s.device.clone())
    }

    /// `action` is one of `on`, `off`, `reset`, `reset_all`.
    pub fn apply_relay_command(&self, relay_id: Option<RelayId>, action: &str) -> Result<()> {
        let action: RelayAction = action.parse()?;
        self.with(|s| -> Result<()> {
            relay_cmd::apply_relay_command(&mut s.device, relay_id, action)?;
            s.mark_dirty();
            Ok(())
        })
    }

    /// Merge an uploaded document into the active device.
    ///
    /// The document is parsed and validated before the lock is taken;
    /// on any error the device is untouched.
    pub fn update_device_from_document(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.upload_limit {
            return Err(Error::ResourceExhausted {
                needed: bytes.len(),
                limit: self.upload_limit,
            });
        }
        let document = codec::parse_bytes(bytes)?;
        let patch = DevicePatch::parse(&document)?;
        self.with(|s| {
            patch.apply(&mut s.device);
            s.mark_dirty();
        });
        Ok(())
    }

    pub fn set_field(&self, path: &str, value: &Value) -> Result<()> {
        self.with(|s| -> Result<()> {
            codec::set_field(&mut s.device, path, value)?;
            s.mark_dirty();
            Ok(())
        })
    }

    /// Apply every `path: value` pair of `updates`; returns how many took.
    pub fn set_fields(&self, updates: &Value) -> Result<usize> {
        self.with(|s| -> Result<usize> {
            let applied = codec::set_fields(&mut s.device, updates)?;
            s.mark_dirty();
            Ok(applied)
        })
    }

    pub fn compute_change_hashes(&self) -> ChangeHashes {
        self.with(|s| ChangeHashes::compute(&s.device))
    }

    pub fn serialize_slice(&self, kind: SliceKind) -> Value {
        self.with(|s| live::serialize_slice(&s.device, kind, &s.static_info()))
    }

    /// Next live-data payload for the poller owning `tracker`.
    pub fn poll_live(&self, tracker: &mut ChangeTracker, force: bool) -> Value {
        self.with(|s| tracker.poll(&s.device, &s.static_info(), force))
    }

    /// Full active profile document.
    pub fn encode_active(&self) -> Value {
        self.with(|s| codec::encode_device(&s.device))
    }

    pub fn sensor_summary(&self) -> String {
        self.with(|s| sensors::summary(&s.device))
    }

    pub fn is_dirty(&self) -> bool {
        self.with(|s| s.is_dirty())
    }
}
