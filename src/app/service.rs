//! Application service: the hexagonal core.
//!
//! [`ControllerService`] owns the rule engine and the document store and
//! shares the live device with the transport through a
//! [`ControllerHandle`].  All I/O flows through port traits injected at
//! call sites.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!   ClockPort ──▶ │    ControllerService     │
//!     PinPort ◀── │  RuleEngine · Store      │ ◀─▶ StoragePort
//!                 └────────────┬─────────────┘
//!                              │ ControllerHandle
//!                              ▼
//!                          transport
//! ```

use log::{info, warn};

use crate::config::ControllerConfig;
use crate::engine::{RuleEngine, sensors};
use crate::error::Result;
use crate::model::Relay;
use crate::state::{AppState, ControllerHandle};
use crate::store::DocumentStore;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, PinPort, SensorPort, StoragePort};

/// Events raised inside the critical section, emitted after it.
#[derive(Default)]
struct EventBuffer(Vec<AppEvent>);

impl EventSink for EventBuffer {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

impl EventBuffer {
    fn drain_into(self, sink: &mut impl EventSink) {
        for event in &self.0 {
            sink.emit(event);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ControllerService
// ───────────────────────────────────────────────────────────────

pub struct ControllerService<S: StoragePort> {
    config: ControllerConfig,
    engine: RuleEngine,
    store: DocumentStore<S>,
    handle: ControllerHandle,
    tick_count: u64,
}

impl<S: StoragePort> ControllerService<S> {
    /// Run the boot policy against `storage` and build the service around
    /// the resulting device.
    pub fn boot(config: ControllerConfig, storage: S, sink: &mut impl EventSink) -> Self {
        let mut store = DocumentStore::new(storage, config.max_document_bytes as usize);
        let booted = store.boot();
        sink.emit(&AppEvent::Booted {
            source: booted.source,
            device: booted.device.name.clone(),
        });
        let handle = ControllerHandle::new(
            AppState::new(booted.device, booted.profiles, booted.active_index),
            &config,
        );
        Self {
            engine: RuleEngine::new(&config),
            config,
            store,
            handle,
            tick_count: 0,
        }
    }

    /// Handle for the transport layer.
    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    pub fn store(&self) -> &DocumentStore<S> {
        &self.store
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle.
    ///
    /// Hardware is only touched outside the critical section: the read
    /// plan is taken under the lock, sensors are read without it, the rules
    /// run under it, and pins are written after it.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + PinPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let uptime_ms = clock.uptime_ms();
        let now = clock.now();

        // 1. Snapshot what to read
        let plan = self.handle.with(|s| {
            s.set_clock(uptime_ms, now);
            sensors::read_plan(&s.device)
        });

        // 2. Read sensors (no lock held)
        let samples = sensors::read_samples(&plan, hw);

        // 3. Evaluate rules in one critical section; rule-driven changes to
        //    persisted fields make the store dirty like any config write
        let mut events = EventBuffer::default();
        let engine = &mut self.engine;
        let outputs: Vec<Relay> = self.handle.with(|s| {
            if engine.evaluate(&mut s.device, &samples, uptime_ms, now, &mut events) {
                s.mark_dirty();
            }
            s.device.output_relays().cloned().collect()
        });

        // 4. Drive pins
        for relay in &outputs {
            hw.write_pin(relay, relay.state);
        }

        // 5. Publish events and flush config
        events.drain_into(sink);
        if let Err(e) = self.auto_save_if_needed(uptime_ms, sink) {
            warn!("Auto-save failed: {}", e);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Rejected commands change nothing.
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            AppCommand::Relay { id, action } => self.handle.apply_relay_command(id, &action),
            AppCommand::UpdateDevice(bytes) => self.handle.update_device_from_document(&bytes),
            AppCommand::SetField { path, value } => self.handle.set_field(&path, &value),
            AppCommand::SaveNow => self.save_now(sink).map(|_| ()),
            AppCommand::FactoryReset => self.factory_reset(sink),
        }
    }

    // ── Persistence ───────────────────────────────────────────

    /// Flush once the store has been dirty for `autosave_delay_ms`.
    /// Returns `true` if it saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, sink: &mut impl EventSink) -> Result<bool> {
        let Some(since) = self.handle.with(|s| s.dirty_since_ms()) else {
            return Ok(false);
        };
        if now_ms.saturating_sub(since) < u64::from(self.config.autosave_delay_ms) {
            return Ok(false);
        }
        self.save_now(sink)?;
        Ok(true)
    }

    /// Flush immediately if anything is unsaved (before restart or deep
    /// sleep).
    pub fn force_save_if_dirty(&mut self, sink: &mut impl EventSink) -> Result<bool> {
        if !self.handle.is_dirty() {
            return Ok(false);
        }
        self.save_now(sink)?;
        Ok(true)
    }

    /// Encode under the lock, write outside it.  Returns the bytes written.
    pub fn save_now(&mut self, sink: &mut impl EventSink) -> Result<usize> {
        let (document, revision) = self.handle.with(|s| (s.store_document(), s.revision()));
        let bytes = self.store.save_document(&document)?;
        self.handle.with(|s| s.mark_saved(revision));
        info!("Device store saved ({} bytes)", bytes);
        sink.emit(&AppEvent::Saved { bytes });
        Ok(bytes)
    }

    /// Delete the stored document and re-run the boot policy, which
    /// persists a fresh factory default.
    pub fn factory_reset(&mut self, sink: &mut impl EventSink) -> Result<()> {
        self.store.delete_document()?;
        let booted = self.store.boot();
        self.handle.with(|s| {
            s.replace(booted.device, booted.profiles, booted.active_index);
        });
        self.engine = RuleEngine::new(&self.config);
        sink.emit(&AppEvent::FactoryReset);
        Ok(())
    }
}
