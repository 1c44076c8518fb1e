//! RelayMini controller library.
//!
//! Exposes the device model, wire codec, rule engine and service core for
//! integration testing and for the firmware binary.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod arbiter;
pub mod bits;
pub mod checksum;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod live;
pub mod model;
pub mod relay_cmd;
pub mod state;
pub mod store;

mod pins;

// Hardware-facing modules; the simulation paths build on the host.
pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;

pub use error::{Error, Result};
