//! RelayMini firmware entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink   NvsAdapter    SystemClock   │
//! │  (Sensor + Pin)     (EventSink)    (Config+NVS)  (ClockPort)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ControllerService (pure logic)                │    │
//! │  │  RuleEngine · DocumentStore · ControllerHandle         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transport (web UI, WebSocket) talks to the core through a cloned
//! [`ControllerHandle`](relaymini::state::ControllerHandle).
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
// Provides the critical-section impl behind the shared handle.
use esp_idf_hal as _;
use log::{debug, info, warn};

use relaymini::adapters::hardware::HardwareAdapter;
use relaymini::adapters::log_sink::LogEventSink;
use relaymini::adapters::nvs::NvsAdapter;
use relaymini::adapters::time::SystemClock;
use relaymini::app::ports::ConfigPort;
use relaymini::app::service::ControllerService;
use relaymini::config::ControllerConfig;
use relaymini::drivers::{hw_init, watchdog};
use relaymini::live::ChangeTracker;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RelayMini v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    hw_init::init_peripherals().map_err(|e| anyhow::anyhow!("HAL init failed: {}", e))?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("NVS init failed")?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            ControllerConfig::default()
        }
    };
    let watchdog = watchdog::Watchdog::new(watchdog::timeout_for_cycle(config.control_cycle_ms));

    // ── 3. Construct adapters and the service ─────────────────
    let mut hw = HardwareAdapter::new();
    let clock = SystemClock::new(config.clock_min_year);
    let mut log_sink = LogEventSink::new();

    let cycle = Duration::from_millis(u64::from(config.control_cycle_ms));
    let mut service = ControllerService::boot(config, nvs, &mut log_sink);
    let handle = service.handle();
    let mut live = ChangeTracker::new();

    info!("System ready. Entering control loop ({} ms).", cycle.as_millis());

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        let started = Instant::now();

        service.tick(&mut hw, &clock, &mut log_sink);

        // The static block goes out every poll; log only real changes.
        let update = handle.poll_live(&mut live, false);
        if update.as_object().is_some_and(|m| m.len() > 1) {
            debug!("live: {}", update);
        }
        if service.tick_count() % 60 == 0 {
            info!("sensors: {}", handle.sensor_summary());
        }

        watchdog.feed();
        std::thread::sleep(cycle.saturating_sub(started.elapsed()));
    }
}
