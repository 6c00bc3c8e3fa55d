//! Dew-point estimation and the validated ambient sample.
//!
//! Magnus-form approximation:
//!
//! ```text
//! logEx    = 0.66077 + 7.5·T/(237.3+T) + (log10(H) − 2)
//! dewpoint = (logEx − 0.66077)·237.3 / (0.66077 + 7.5 − logEx)
//! ```
//!
//! The formula is meaningless for `H ≤ 0`; [`AmbientSample`] only invokes it
//! when both inputs are valid, so callers never see a NaN dew point.

use crate::app::ports::AmbientReading;

const MAGNUS_C0: f32 = 0.66077;
const MAGNUS_A: f32 = 7.5;
const MAGNUS_B: f32 = 237.3;

/// Dew point in °C for ambient temperature `t_c` and relative humidity
/// `rh_pct` (0–100).
pub fn dew_point_c(t_c: f32, rh_pct: f32) -> f32 {
    let log_ex = MAGNUS_C0 + MAGNUS_A * t_c / (MAGNUS_B + t_c) + (rh_pct.log10() - 2.0);
    (log_ex - MAGNUS_C0) * MAGNUS_B / (MAGNUS_C0 + MAGNUS_A - log_ex)
}

/// Ambient temperature, humidity and derived dew point, each independently
/// valid or not.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbientSample {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub dew_point_c: Option<f32>,
}

impl AmbientSample {
    /// Build a sample from a raw sensor reading.  `bias_c` is the user
    /// calibration added to a valid temperature before the dew point is
    /// derived from it.
    pub fn from_reading(reading: AmbientReading, bias_c: i8) -> Self {
        let temperature_c = reading
            .temperature_c
            .filter(|t| t.is_finite())
            .map(|t| t + f32::from(bias_c));
        let humidity_pct = reading.humidity_pct.filter(|h| h.is_finite());

        let dew_point_c = match (temperature_c, humidity_pct) {
            (Some(t), Some(h)) if h > 0.0 => Some(dew_point_c(t, h)).filter(|d| d.is_finite()),
            _ => None,
        };

        Self {
            temperature_c,
            humidity_pct,
            dew_point_c,
        }
    }

    /// `true` when every quantity is valid.
    pub fn is_complete(&self) -> bool {
        self.temperature_c.is_some() && self.humidity_pct.is_some() && self.dew_point_c.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_value_at_20c_50pct() {
        let dp = dew_point_c(20.0, 50.0);
        assert!((dp - 9.27).abs() < 0.01, "got {dp}");
    }

    #[test]
    fn saturated_air_dew_point_equals_temperature() {
        let dp = dew_point_c(15.0, 100.0);
        assert!((dp - 15.0).abs() < 0.01, "got {dp}");
    }

    #[test]
    fn bias_applied_before_dew_point() {
        let raw = AmbientReading {
            temperature_c: Some(17.0),
            humidity_pct: Some(50.0),
        };
        let s = AmbientSample::from_reading(raw, 3);
        assert_eq!(s.temperature_c, Some(20.0));
        let dp = s.dew_point_c.unwrap();
        assert!((dp - 9.27).abs() < 0.01);
    }

    #[test]
    fn zero_humidity_has_no_dew_point() {
        let raw = AmbientReading {
            temperature_c: Some(10.0),
            humidity_pct: Some(0.0),
        };
        let s = AmbientSample::from_reading(raw, 0);
        assert_eq!(s.temperature_c, Some(10.0));
        assert_eq!(s.dew_point_c, None);
        assert!(!s.is_complete());
    }

    #[test]
    fn failed_temperature_invalidates_dew_point_only() {
        let raw = AmbientReading {
            temperature_c: None,
            humidity_pct: Some(60.0),
        };
        let s = AmbientSample::from_reading(raw, 0);
        assert_eq!(s.temperature_c, None);
        assert_eq!(s.humidity_pct, Some(60.0));
        assert_eq!(s.dew_point_c, None);
    }

    #[test]
    fn nan_reading_is_treated_as_invalid() {
        let raw = AmbientReading {
            temperature_c: Some(f32::NAN),
            humidity_pct: Some(f32::INFINITY),
        };
        let s = AmbientSample::from_reading(raw, 0);
        assert_eq!(s, AmbientSample::default());
    }
}
