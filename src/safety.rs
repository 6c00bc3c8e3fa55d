//! Board-temperature fan supervisor.
//!
//! When a fan-on threshold is configured the fan is driven by the
//! controller's board temperature with hysteresis:
//!
//! ```text
//!            board ≥ on                       board < off
//!   Idle ───────────────────▶ Latched ─────────────────────▶ Idle
//!   (fan = user setting)      (fan = 100 %)                  (fan = 0 %)
//! ```
//!
//! Between the two thresholds the latch holds, so the fan does not chatter.
//! Every transition rewrites the fan speed in the configuration and must be
//! persisted by the caller.  A missing board reading leaves the latch alone.

use log::{debug, info};

use crate::config::DewConfig;
use crate::control::policy::PowerLevel;

/// Outcome of one supervisor evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanTransition {
    /// Nothing changed.
    Unchanged,
    /// Board over the on-threshold; fan forced to 100 %.
    LatchedOn,
    /// Board cooled below the off-threshold; fan stopped.
    Released,
}

impl FanTransition {
    /// The configuration changed and should be written back.
    pub fn is_change(self) -> bool {
        self != Self::Unchanged
    }
}

#[derive(Debug, Default)]
pub struct FanSupervisor {
    latched: bool,
}

impl FanSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Evaluate the latch against the latest board temperature and update
    /// the configured fan speed on a transition.
    pub fn evaluate(&mut self, board_c: Option<f32>, config: &mut DewConfig) -> FanTransition {
        if !config.fan_temperature_controlled() {
            if self.latched {
                info!("FanSupervisor: temperature control disabled, latch dropped");
                self.latched = false;
            }
            return FanTransition::Unchanged;
        }

        let Some(board) = board_c.filter(|t| t.is_finite()) else {
            debug!("FanSupervisor: board temperature unavailable, holding state");
            return FanTransition::Unchanged;
        };

        if self.latched && board < f32::from(config.fan_off_c()) {
            self.latched = false;
            config.set_fan_speed(0);
            info!(
                "FanSupervisor: board {:.1}°C < {}°C, fan released",
                board,
                config.fan_off_c()
            );
            FanTransition::Released
        } else if self.latched || board >= f32::from(config.fan_on_c()) {
            // While latched the fan stays at full speed, whatever was
            // requested in between.
            if self.latched && config.fan_speed() == PowerLevel::Full {
                return FanTransition::Unchanged;
            }
            self.latched = true;
            config.set_fan_speed(i32::from(PowerLevel::Full.percent()));
            info!(
                "FanSupervisor: board {:.1}°C, on at {}°C, fan latched on",
                board,
                config.fan_on_c()
            );
            FanTransition::LatchedOn
        } else {
            FanTransition::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controlled(on: i32, off: i32) -> DewConfig {
        let mut c = DewConfig::default();
        c.set_fan_on_threshold(on);
        c.set_fan_off_threshold(off);
        c
    }

    #[test]
    fn latches_on_and_holds_between_thresholds() {
        let mut cfg = controlled(40, 35);
        let mut s = FanSupervisor::new();

        assert_eq!(s.evaluate(Some(30.0), &mut cfg), FanTransition::Unchanged);
        assert_eq!(cfg.fan_speed(), PowerLevel::Off);

        assert_eq!(s.evaluate(Some(40.0), &mut cfg), FanTransition::LatchedOn);
        assert_eq!(cfg.fan_speed(), PowerLevel::Full);
        assert!(s.is_latched());

        assert_eq!(s.evaluate(Some(41.0), &mut cfg), FanTransition::Unchanged);
        assert_eq!(s.evaluate(Some(37.0), &mut cfg), FanTransition::Unchanged);
        assert_eq!(s.evaluate(Some(35.0), &mut cfg), FanTransition::Unchanged);
        assert_eq!(cfg.fan_speed(), PowerLevel::Full);

        assert_eq!(s.evaluate(Some(34.9), &mut cfg), FanTransition::Released);
        assert_eq!(cfg.fan_speed(), PowerLevel::Off);
        assert!(!s.is_latched());
    }

    #[test]
    fn no_release_without_prior_latch() {
        let mut cfg = controlled(40, 35);
        cfg.set_fan_speed(50);
        let mut s = FanSupervisor::new();
        assert_eq!(s.evaluate(Some(20.0), &mut cfg), FanTransition::Unchanged);
        assert_eq!(cfg.fan_speed(), PowerLevel::P50);
    }

    #[test]
    fn user_speed_change_while_hot_is_reasserted() {
        let mut cfg = controlled(40, 35);
        let mut s = FanSupervisor::new();
        s.evaluate(Some(45.0), &mut cfg);
        cfg.set_fan_speed(20);
        assert_eq!(s.evaluate(Some(45.0), &mut cfg), FanTransition::LatchedOn);
        assert_eq!(cfg.fan_speed(), PowerLevel::Full);
    }

    #[test]
    fn lowered_speed_between_thresholds_is_reasserted() {
        let mut cfg = controlled(40, 35);
        let mut s = FanSupervisor::new();
        s.evaluate(Some(45.0), &mut cfg);
        assert_eq!(s.evaluate(Some(38.0), &mut cfg), FanTransition::Unchanged);
        cfg.set_fan_speed(20);
        assert_eq!(s.evaluate(Some(38.0), &mut cfg), FanTransition::LatchedOn);
        assert_eq!(cfg.fan_speed(), PowerLevel::Full);
        assert!(s.is_latched());
    }

    #[test]
    fn missing_board_reading_holds_latch() {
        let mut cfg = controlled(40, 35);
        let mut s = FanSupervisor::new();
        s.evaluate(Some(45.0), &mut cfg);
        assert_eq!(s.evaluate(None, &mut cfg), FanTransition::Unchanged);
        assert!(s.is_latched());
    }

    #[test]
    fn disabled_control_never_touches_fan() {
        let mut cfg = DewConfig::default();
        cfg.set_fan_speed(75);
        let mut s = FanSupervisor::new();
        assert_eq!(s.evaluate(Some(90.0), &mut cfg), FanTransition::Unchanged);
        assert_eq!(cfg.fan_speed(), PowerLevel::P75);
    }

    #[test]
    fn disabling_control_drops_latch() {
        let mut cfg = controlled(40, 35);
        let mut s = FanSupervisor::new();
        s.evaluate(Some(45.0), &mut cfg);
        cfg.set_fan_on_threshold(0);
        s.evaluate(Some(45.0), &mut cfg);
        assert!(!s.is_latched());
    }
}
