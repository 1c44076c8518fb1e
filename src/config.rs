//! Controller configuration parameters
//!
//! Tunables for the control loop and persistence.  Stored as a postcard blob
//! through [`ConfigPort`](crate::app::ports::ConfigPort); device profiles
//! live in a separate document.

use serde::{Deserialize, Serialize};

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Timing ---
    /// Control cycle period (milliseconds)
    pub control_cycle_ms: u32,
    /// Quiet period after the last config write before auto-save (milliseconds)
    pub autosave_delay_ms: u32,

    // --- Temperature loop ---
    /// Time-proportioning window (milliseconds)
    pub pid_window_ms: u32,
    /// Largest on-time change per cycle when smoothing, as % of the window
    pub smoothing_step_percent: u8,

    // --- Documents ---
    /// Ceiling for an encoded device store (bytes)
    pub max_document_bytes: u32,
    /// Extra headroom accepted for uploads above the document ceiling (bytes)
    pub upload_margin_bytes: u32,

    // --- Clock ---
    /// Wall-clock years before this are treated as "not synchronised"
    pub clock_min_year: i32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Timing
            control_cycle_ms: 1000,
            autosave_delay_ms: 5000,

            // Temperature loop
            pid_window_ms: 5000,
            smoothing_step_percent: 5,

            // Documents
            max_document_bytes: 8192,
            upload_margin_bytes: 1024,

            // Clock
            clock_min_year: 2025,
        }
    }
}

impl ControllerConfig {
    /// Largest upload body accepted.
    pub fn upload_limit(&self) -> usize {
        (self.max_document_bytes as usize).saturating_add(self.upload_margin_bytes as usize)
    }
}
