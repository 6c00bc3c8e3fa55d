//! Heater control core: pure domain logic, zero I/O.
//!
//! ```text
//!   AmbientReading ──▶ dewpoint ──▶ AmbientSample ─┐
//!                                                  ▼
//!   probe readings ─────────────────────────▶ ChannelBank ──▶ duty[3]
//!                                                  ▲
//!                       policy::power_level ───────┘
//! ```

pub mod channels;
pub mod dewpoint;
pub mod policy;

pub use channels::{ChannelBank, ChannelId, ChannelState, SwitchState};
pub use dewpoint::{AmbientSample, dew_point_c};
pub use policy::{PowerLevel, power_level, power_for_sample};
