//! Override toggle switches on a resistor ladder.
//!
//! Both switches share one ADC input; each combination pulls the divider
//! to a distinct band.  Bands are on a 10-bit scale (0–1023), so the 12-bit
//! oneshot result is shifted down before classification.
//!
//! ```text
//!   1023 ┬───────── open (none)
//!    720 ┼─ SW1 ───  650
//!    530 ┼─ both ──  460
//!    380 ┼─ SW2 ───  310
//!      0 ┴─ anything else: none
//! ```

use core::sync::atomic::{AtomicU16, Ordering};

use crate::control::channels::SwitchState;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_LADDER_RAW: AtomicU16 = AtomicU16::new(1023);

/// Inject a 10-bit ladder reading.
pub fn sim_set_ladder(raw10: u16) {
    SIM_LADDER_RAW.store(raw10, Ordering::Relaxed);
}

/// Classify a 10-bit ladder reading.
pub fn decode_ladder(raw10: u16) -> SwitchState {
    match raw10 {
        650..=720 => SwitchState::Sw1,
        460..=530 => SwitchState::Both,
        310..=380 => SwitchState::Sw2,
        _ => SwitchState::None,
    }
}

#[derive(Debug, Default)]
pub struct SwitchLadder;

impl SwitchLadder {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> SwitchState {
        decode_ladder(hw_init::adc1_read(hw_init::ADC1_CH_SWITCHES) >> 2)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> SwitchState {
        decode_ladder(SIM_LADDER_RAW.load(Ordering::Relaxed))
    }
}
