//! DS18B20 temperature probe, one per 1-Wire bus.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the probe's data line through [`OneWire`].
//! On host/test: reads from static atomics for injection (NaN = absent).
//!
//! [`OneWire`]: crate::drivers::onewire::OneWire

use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::SensorError;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init::OpenDrainPin;
#[cfg(target_os = "espidf")]
use crate::drivers::onewire::{CONVERT_T, OneWire, READ_SCRATCHPAD, WRITE_SCRATCHPAD};

pub const SCRATCHPAD_LEN: usize = 9;
pub const PROBE_MIN_C: f32 = -55.0;
pub const PROBE_MAX_C: f32 = 125.0;

/// Injection slots: the three channel probes then the board probe.
pub const SLOT_COUNT: usize = 4;
pub const BOARD_SLOT: usize = 3;

const ABSENT: u32 = f32::NAN.to_bits();
static SIM_PROBES: [AtomicU32; SLOT_COUNT] = [
    AtomicU32::new(ABSENT),
    AtomicU32::new(ABSENT),
    AtomicU32::new(ABSENT),
    AtomicU32::new(ABSENT),
];

/// Inject a probe reading (`None` = probe unplugged).
pub fn sim_set_probe(slot: usize, celsius: Option<f32>) {
    if let Some(s) = SIM_PROBES.get(slot) {
        s.store(celsius.unwrap_or(f32::NAN).to_bits(), Ordering::Relaxed);
    }
}

#[cfg_attr(target_os = "espidf", allow(dead_code))]
fn sim_probe(slot: usize) -> Option<f32> {
    SIM_PROBES
        .get(slot)
        .map(|s| f32::from_bits(s.load(Ordering::Relaxed)))
        .filter(|t| !t.is_nan())
}

/// Dallas/Maxim CRC-8 (reflected polynomial 0x8C).  Running it over a
/// full scratchpad, CRC byte included, yields 0 when intact.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |mut crc, &byte| {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
        crc
    })
}

/// Configuration register value for a 9–12 bit resolution.
pub fn config_register(resolution_bits: u8) -> u8 {
    ((resolution_bits.clamp(9, 12) - 9) << 5) | 0x1F
}

/// Decode a scratchpad into °C.
///
/// Bits below the configured resolution are undefined on the wire and are
/// cleared before scaling.
pub fn decode_scratchpad(sp: &[u8; SCRATCHPAD_LEN]) -> Result<f32, SensorError> {
    // A bus stuck low reads as all zeros, which passes the CRC.
    if sp.iter().all(|&b| b == 0) {
        return Err(SensorError::NoPresence);
    }
    if crc8(sp) != 0 {
        return Err(SensorError::CrcMismatch);
    }
    let bits = 9 + ((sp[4] >> 5) & 0x03);
    let undefined = (1i16 << (12 - bits)) - 1;
    let raw = i16::from_le_bytes([sp[0], sp[1]]) & !undefined;
    let celsius = f32::from(raw) / 16.0;
    if !(PROBE_MIN_C..=PROBE_MAX_C).contains(&celsius) {
        return Err(SensorError::OutOfRange);
    }
    Ok(celsius)
}

pub struct TemperatureProbe {
    slot: usize,
    resolution_bits: u8,
    #[cfg(target_os = "espidf")]
    bus: OneWire<OpenDrainPin, esp_idf_hal::delay::Ets>,
}

impl TemperatureProbe {
    pub fn new(gpio: i32, slot: usize, resolution_bits: u8) -> Self {
        #[cfg(not(target_os = "espidf"))]
        let _ = gpio;
        Self {
            slot,
            resolution_bits,
            #[cfg(target_os = "espidf")]
            bus: OneWire::new(OpenDrainPin(gpio), esp_idf_hal::delay::Ets),
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Presence check.  A probe that answers is also programmed with the
    /// configured resolution.
    #[cfg(target_os = "espidf")]
    pub fn detect(&mut self) -> bool {
        let configure = |bus: &mut OneWire<OpenDrainPin, _>, bits| -> Result<(), SensorError> {
            bus.skip_rom()?;
            bus.write_bytes(&[WRITE_SCRATCHPAD, 0x00, 0x00, config_register(bits)])
        };
        match configure(&mut self.bus, self.resolution_bits) {
            Ok(()) => true,
            Err(SensorError::NoPresence) => false,
            Err(e) => {
                log::warn!("probe[{}]: configure failed: {}", self.slot, e);
                true
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn detect(&mut self) -> bool {
        let _ = self.resolution_bits;
        sim_probe(self.slot).is_some()
    }

    #[cfg(target_os = "espidf")]
    pub fn start_conversion(&mut self) -> Result<(), SensorError> {
        self.bus.skip_rom()?;
        self.bus.write_byte(CONVERT_T)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start_conversion(&mut self) -> Result<(), SensorError> {
        sim_probe(self.slot).map(|_| ()).ok_or(SensorError::NoPresence)
    }

    /// Fetch the last conversion.
    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> Result<f32, SensorError> {
        self.bus.skip_rom()?;
        self.bus.write_byte(READ_SCRATCHPAD)?;
        let mut sp = [0u8; SCRATCHPAD_LEN];
        self.bus.read_bytes(&mut sp)?;
        decode_scratchpad(&sp)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> Result<f32, SensorError> {
        sim_probe(self.slot).ok_or(SensorError::NoPresence)
    }
}
