//! Power-level policy: probe temperature → discrete heater power.
//!
//! Stateless and deterministic.  Each tracking mode is a step function of
//! the distance between the channel temperature and a reference point,
//! shifted by the global offset:
//!
//! | Mode     | Reference                        | Steps (descending check)              |
//! |----------|----------------------------------|---------------------------------------|
//! | DewPoint | dew point                        | +6→0, +5→10, +4→20, +3→50, +2→75, →100 |
//! | Ambient  | ambient                          | −9→100, −7→75, −5→50, −3→20, −1→10, →0 |
//! | Halfway  | amb − (amb − ⌊dp⌋)/2             | +0→0, +2→20, +4→50, +6→100, →100       |
//!
//! Halfway mode checks its thresholds from the lowest upwards, so in
//! practice it behaves as a two-level controller (0 at or above the
//! reference, 100 below).  That observed behaviour is kept as-is.

use serde::{Deserialize, Serialize};

use crate::config::TrackingMode;
use crate::control::dewpoint::AmbientSample;

/// Discrete heater/fan power level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PowerLevel {
    #[default]
    Off = 0,
    P10 = 10,
    P20 = 20,
    P50 = 50,
    P75 = 75,
    Full = 100,
}

impl PowerLevel {
    pub const ALL: [Self; 6] = [Self::Off, Self::P10, Self::P20, Self::P50, Self::P75, Self::Full];

    /// Clamp `pct` to 0–100 and snap it down to the nearest level.
    pub fn floor_percent(pct: i32) -> Self {
        match pct.clamp(0, 100) {
            100 => Self::Full,
            75..=99 => Self::P75,
            50..=74 => Self::P50,
            20..=49 => Self::P20,
            10..=19 => Self::P10,
            _ => Self::Off,
        }
    }

    pub const fn percent(self) -> u8 {
        self as u8
    }
}

/// Map an 0–100 percentage onto the 8-bit heater duty (`pct × 2.54`).
pub fn percent_to_duty(pct: u8) -> u8 {
    (f32::from(pct.min(100)) * 2.54) as u8
}

/// Power level for a valid channel temperature.
///
/// `TrackingMode::Disabled` (any unrecognised mode code) yields `Off`.
pub fn power_level(
    channel_c: f32,
    mode: TrackingMode,
    ambient_c: f32,
    dew_point_c: f32,
    offset: i8,
) -> PowerLevel {
    let off = f32::from(offset);
    match mode {
        TrackingMode::DewPoint => {
            let r = dew_point_c + off;
            if channel_c >= r + 6.0 {
                PowerLevel::Off
            } else if channel_c >= r + 5.0 {
                PowerLevel::P10
            } else if channel_c >= r + 4.0 {
                PowerLevel::P20
            } else if channel_c >= r + 3.0 {
                PowerLevel::P50
            } else if channel_c >= r + 2.0 {
                PowerLevel::P75
            } else {
                PowerLevel::Full
            }
        }
        TrackingMode::Ambient => {
            let r = ambient_c + off;
            if channel_c <= r - 9.0 {
                PowerLevel::Full
            } else if channel_c <= r - 7.0 {
                PowerLevel::P75
            } else if channel_c <= r - 5.0 {
                PowerLevel::P50
            } else if channel_c <= r - 3.0 {
                PowerLevel::P20
            } else if channel_c <= r - 1.0 {
                PowerLevel::P10
            } else {
                PowerLevel::Off
            }
        }
        TrackingMode::Halfway => {
            let r = ambient_c - (ambient_c - dew_point_c.floor()) / 2.0 + off;
            if channel_c >= r {
                PowerLevel::Off
            } else if channel_c >= r + 2.0 {
                PowerLevel::P20
            } else if channel_c >= r + 4.0 {
                PowerLevel::P50
            } else {
                // The +6 step and the tail both land on full power.
                PowerLevel::Full
            }
        }
        TrackingMode::Disabled => PowerLevel::Off,
    }
}

/// Fail-safe wrapper: any invalid input the mode depends on yields `Off`
/// instead of running the policy against a placeholder.
pub fn power_for_sample(
    channel_c: Option<f32>,
    mode: TrackingMode,
    ambient: &AmbientSample,
    offset: i8,
) -> PowerLevel {
    let Some(t) = channel_c.filter(|t| t.is_finite()) else {
        return PowerLevel::Off;
    };
    match mode {
        TrackingMode::DewPoint => match ambient.dew_point_c {
            Some(dp) => power_level(t, mode, 0.0, dp, offset),
            None => PowerLevel::Off,
        },
        TrackingMode::Ambient => match ambient.temperature_c {
            Some(amb) => power_level(t, mode, amb, 0.0, offset),
            None => PowerLevel::Off,
        },
        TrackingMode::Halfway => match (ambient.temperature_c, ambient.dew_point_c) {
            (Some(amb), Some(dp)) => power_level(t, mode, amb, dp, offset),
            _ => PowerLevel::Off,
        },
        TrackingMode::Disabled => PowerLevel::Off,
    }
}
