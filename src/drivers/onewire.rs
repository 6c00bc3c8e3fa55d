//! Bit-banged 1-Wire bus master (standard speed).
//!
//! The pin must be open-drain: driving low pulls the bus down, driving
//! high releases it to the external pull-up.  Slot timings follow the
//! DS18B20 datasheet.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

pub const SKIP_ROM: u8 = 0xCC;
pub const CONVERT_T: u8 = 0x44;
pub const READ_SCRATCHPAD: u8 = 0xBE;
pub const WRITE_SCRATCHPAD: u8 = 0x4E;

const RESET_LOW_US: u32 = 480;
const PRESENCE_SAMPLE_US: u32 = 70;
const RESET_RECOVERY_US: u32 = 410;
const WRITE_ONE_LOW_US: u32 = 6;
const WRITE_ONE_RELEASE_US: u32 = 64;
const WRITE_ZERO_LOW_US: u32 = 60;
const WRITE_ZERO_RELEASE_US: u32 = 10;
const READ_LOW_US: u32 = 6;
const READ_SAMPLE_US: u32 = 9;
const READ_RECOVERY_US: u32 = 55;

pub struct OneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    fn low(&mut self) -> Result<(), SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Bus)
    }

    fn release(&mut self) -> Result<(), SensorError> {
        self.pin.set_high().map_err(|_| SensorError::Bus)
    }

    /// Reset pulse.  `Ok(true)` when a device answered with a presence pulse.
    pub fn reset(&mut self) -> Result<bool, SensorError> {
        self.low()?;
        self.delay.delay_us(RESET_LOW_US);
        self.release()?;
        self.delay.delay_us(PRESENCE_SAMPLE_US);
        let present = self.pin.is_low().map_err(|_| SensorError::Bus)?;
        self.delay.delay_us(RESET_RECOVERY_US);
        Ok(present)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), SensorError> {
        let (low_us, release_us) = if bit {
            (WRITE_ONE_LOW_US, WRITE_ONE_RELEASE_US)
        } else {
            (WRITE_ZERO_LOW_US, WRITE_ZERO_RELEASE_US)
        };
        self.low()?;
        self.delay.delay_us(low_us);
        self.release()?;
        self.delay.delay_us(release_us);
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, SensorError> {
        self.low()?;
        self.delay.delay_us(READ_LOW_US);
        self.release()?;
        self.delay.delay_us(READ_SAMPLE_US);
        let bit = self.pin.is_high().map_err(|_| SensorError::Bus)?;
        self.delay.delay_us(READ_RECOVERY_US);
        Ok(bit)
    }

    /// Least-significant bit first.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), SensorError> {
        (0..8).try_for_each(|i| self.write_bit(byte & (1 << i) != 0))
    }

    pub fn read_byte(&mut self) -> Result<u8, SensorError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SensorError> {
        bytes.iter().try_for_each(|&b| self.write_byte(b))
    }

    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), SensorError> {
        for b in buf.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(())
    }

    /// Reset then address every device on the bus.
    pub fn skip_rom(&mut self) -> Result<(), SensorError> {
        if !self.reset()? {
            return Err(SensorError::NoPresence);
        }
        self.write_byte(SKIP_ROM)
    }
}
