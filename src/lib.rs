//! Dew heater controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod display;
pub mod error;
pub mod protocol;
pub mod safety;
pub mod scheduler;

pub mod pins;

// Hardware-facing modules compile on every target; the actual register
// access is guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
