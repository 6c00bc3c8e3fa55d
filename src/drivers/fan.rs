//! Cooling fan driver.
//!
//! The fan runs from LEDC channel 3.  Speed levels map onto the upper part
//! of the PWM range, above the stall point:
//!
//! | Level | Duty | LED   |
//! |-------|------|-------|
//! | 100 % | 254  | red   |
//! |  75 % | 240  | green |
//! |  50 % | 220  | blue  |
//! |  20 % | 200  | blue  |
//! |  10 % | 180  | blue  |
//! |   0 % |   0  | off   |

use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

use crate::control::policy::PowerLevel;
use crate::drivers::status_led::{LedColour, StatusLed};

/// PWM duty and indicator colour for a speed level.
pub const fn fan_output(level: PowerLevel) -> (u8, LedColour) {
    match level {
        PowerLevel::Full => (254, LedColour::Red),
        PowerLevel::P75 => (240, LedColour::Green),
        PowerLevel::P50 => (220, LedColour::Blue),
        PowerLevel::P20 => (200, LedColour::Blue),
        PowerLevel::P10 => (180, LedColour::Blue),
        PowerLevel::Off => (0, LedColour::Off),
    }
}

pub struct FanDriver<P> {
    pwm: P,
    led: StatusLed,
    speed: PowerLevel,
}

impl<P: SetDutyCycle> FanDriver<P> {
    pub fn new(pwm: P, led: StatusLed) -> Self {
        Self {
            pwm,
            led,
            speed: PowerLevel::Off,
        }
    }

    pub fn set_speed(&mut self, level: PowerLevel) {
        let (duty, colour) = fan_output(level);
        if let Err(e) = self.pwm.set_duty_cycle_fraction(u16::from(duty), u16::from(u8::MAX)) {
            warn!("fan: duty write failed: {:?}", e);
            return;
        }
        self.led.set(colour);
        if level != self.speed {
            debug!("fan: {}% (duty {})", level.percent(), duty);
        }
        self.speed = level;
    }

    pub fn speed(&self) -> PowerLevel {
        self.speed
    }

    pub fn led(&self) -> LedColour {
        self.led.current()
    }
}
