//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one tagged line per application
//! event to the logger (UART / USB-CDC in production).  A push-notification
//! adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::{AppEvent, BootSource};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted { source, device } => match source {
                BootSource::Stored => info!("BOOT | device '{}' loaded from flash", device),
                BootSource::FirstBoot => info!("BOOT | first boot, factory device '{}'", device),
                BootSource::Fallback => {
                    warn!("BOOT | stored devices unreadable, running factory '{}'", device);
                }
            },
            AppEvent::ActionFired { label, message } => {
                if message.is_empty() {
                    info!("ACTION | '{}' fired", label);
                } else {
                    info!("ACTION | '{}' fired: {}", label, message);
                }
            }
            AppEvent::ActionCleared { label } => {
                info!("ACTION | '{}' cleared", label);
            }
            AppEvent::TimerStarted { index } => {
                info!("TIMER | #{} started", index);
            }
            AppEvent::TimerFinished { index, rearmed } => {
                info!("TIMER | #{} finished{}", index, if *rearmed { ", re-armed" } else { "" });
            }
            AppEvent::ScheduleOpened { label } => {
                info!("SCHED | '{}' window opened", label);
            }
            AppEvent::ScheduleClosed { label } => {
                info!("SCHED | '{}' window closed", label);
            }
            AppEvent::Saved { bytes } => {
                info!("SAVE | {} bytes written", bytes);
            }
            AppEvent::FactoryReset => {
                warn!("SAVE | factory reset, store rewritten");
            }
        }
    }
}
