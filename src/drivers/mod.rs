//! Actuator drivers, sensor buses, hardware initialisation, and peripheral helpers.

pub mod fan;
pub mod heater;
pub mod hw_init;
pub mod onewire;
pub mod status_led;
pub mod switches;
pub mod watchdog;
