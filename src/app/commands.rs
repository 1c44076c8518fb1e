//! Inbound commands to the application service.
//!
//! These are the requests the transport layer (HTTP handlers, serial
//! console) hands to [`ControllerService`](super::service::ControllerService).
//! Read-only queries go straight through the
//! [`ControllerHandle`](crate::state::ControllerHandle) instead.

use serde_json::Value;

use crate::model::RelayId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Manual relay action: `on`, `off`, `reset`, `reset_all`.
    Relay {
        id: Option<RelayId>,
        action: String,
    },

    /// Merge an uploaded device document into the active profile.
    UpdateDevice(Vec<u8>),

    /// Set one field by path, e.g. `tmr[0].use`.
    SetField { path: String, value: Value },

    /// Persist the store now instead of waiting for auto-save.
    SaveNow,

    /// Delete the stored document and boot the factory default.
    FactoryReset,
}
