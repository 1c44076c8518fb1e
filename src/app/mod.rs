//! Application core: orchestration over port traits.
//!
//! The rule engine, codec and store are wired together here by
//! [`service::ControllerService`].  Hardware, clock, flash and logging are
//! reached only through the traits in [`ports`], so the whole layer runs on
//! the host against mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod upload;
