//! Sensor conversions shared by the read pipeline.
//!
//! Raw pin access lives behind [`SensorPort`](crate::app::ports::SensorPort);
//! this module only turns raw samples into engineering units.

pub mod thermistor;
