//! Pin-level drivers and peripheral bring-up.

pub mod dht;
pub mod hw_init;
pub mod relay_bank;
pub mod watchdog;
