//! Outbound application events.
//!
//! The rule engine and the [`ControllerService`](super::service::ControllerService)
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them: log to serial,
//! forward as a push notification, etc.

use crate::model::{Label, Message};

/// Where the active device came from at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    /// Decoded from the persisted document.
    Stored,
    /// No document existed; the factory default was created and persisted.
    FirstBoot,
    /// The document was unreadable; the factory default runs from memory.
    Fallback,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Booted { source: BootSource, device: Label },

    /// Rising edge of a sensor action.  `message` is the notification text.
    ActionFired { label: Label, message: Message },

    /// Falling edge of a sensor action.
    ActionCleared { label: Label },

    TimerStarted { index: usize },

    TimerFinished { index: usize, rearmed: bool },

    ScheduleOpened { label: Label },

    ScheduleClosed { label: Label },

    /// The store was written to flash.
    Saved { bytes: usize },

    FactoryReset,
}
