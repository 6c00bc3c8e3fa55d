//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the dew-heater control rules: per-cycle channel
//! update, fan supervision, command handling and loop scheduling.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod ports;
pub mod service;
