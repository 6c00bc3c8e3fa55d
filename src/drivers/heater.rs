//! Dew-strap heater driver.
//!
//! Each strap hangs off a logic-level MOSFET driven by one LEDC channel.
//! The driver is written against `embedded_hal::pwm::SetDutyCycle` so it
//! can be exercised on the host with a recording PWM.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`LedcChannel`] writes the LEDC duty register via hw_init.
//! On host/test: the hw_init write is a no-op; state is tracked in-memory.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use log::warn;

use crate::drivers::hw_init;

/// One 8-bit LEDC output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcChannel {
    channel: u32,
}

impl LedcChannel {
    pub const fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }
}

impl ErrorType for LedcChannel {
    type Error = Infallible;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        u16::from(u8::MAX)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        let duty = u8::try_from(duty).unwrap_or(u8::MAX);
        hw_init::ledc_set(self.channel, duty);
        Ok(())
    }
}

pub struct HeaterDriver<P> {
    pwm: P,
    duty: u8,
}

impl<P: SetDutyCycle> HeaterDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, duty: 0 }
    }

    /// Write an 8-bit duty (0 = off, 255 = always on), scaled to the
    /// PWM's own resolution.
    pub fn set_duty(&mut self, duty: u8) {
        if let Err(e) = self.pwm.set_duty_cycle_fraction(u16::from(duty), u16::from(u8::MAX)) {
            warn!("heater: duty write failed: {:?}", e);
            return;
        }
        self.duty = duty;
    }

    pub fn off(&mut self) {
        self.set_duty(0);
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn is_on(&self) -> bool {
        self.duty > 0
    }
}
