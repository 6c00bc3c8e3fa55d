//! RGB status LED driver.
//!
//! Three discrete GPIO outputs; one colour lit at a time.  The LED mirrors
//! the fan speed band so the fan state is visible at a glance.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the three GPIOs via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedColour {
    #[default]
    Off,
    Red,
    Green,
    Blue,
}

#[derive(Debug, Default)]
pub struct StatusLed {
    current: LedColour,
}

impl StatusLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, colour: LedColour) {
        hw_init::gpio_write(pins::LED_R_GPIO, colour == LedColour::Red);
        hw_init::gpio_write(pins::LED_G_GPIO, colour == LedColour::Green);
        hw_init::gpio_write(pins::LED_B_GPIO, colour == LedColour::Blue);
        self.current = colour;
    }

    pub fn off(&mut self) {
        self.set(LedColour::Off);
    }

    pub fn current(&self) -> LedColour {
        self.current
    }
}
