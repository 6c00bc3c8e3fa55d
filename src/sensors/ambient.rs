//! DHT11 / DHT22 ambient temperature and humidity sensor.
//!
//! A read sends the start pulse, then times 40 data bits off the single
//! open-drain line: each bit is a ~50 µs low followed by a high whose
//! length encodes the value (~27 µs = 0, ~70 µs = 1).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the DHT data line, caching the last frame for the
//! sensor's minimum sampling interval.
//! On host/test: reads from static atomics for injection (NaN = missing).

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::AmbientReading;
use crate::config::HumiditySensor;
use crate::error::SensorError;

pub const FRAME_LEN: usize = 5;

/// Longest any single phase of the handshake or a bit may take.
const EDGE_TIMEOUT_US: u32 = 100;
/// High phases longer than this are ones.
const ONE_THRESHOLD_US: u32 = 40;

const MISSING: u32 = f32::NAN.to_bits();
static SIM_TEMP: AtomicU32 = AtomicU32::new(MISSING);
static SIM_HUMIDITY: AtomicU32 = AtomicU32::new(MISSING);

/// Inject an ambient reading (`None` = quantity missing).
pub fn sim_set_ambient(temperature_c: Option<f32>, humidity_pct: Option<f32>) {
    SIM_TEMP.store(temperature_c.unwrap_or(f32::NAN).to_bits(), Ordering::Relaxed);
    SIM_HUMIDITY.store(humidity_pct.unwrap_or(f32::NAN).to_bits(), Ordering::Relaxed);
}

#[cfg_attr(target_os = "espidf", allow(dead_code))]
fn load(slot: &AtomicU32) -> Option<f32> {
    Some(f32::from_bits(slot.load(Ordering::Relaxed))).filter(|v| !v.is_nan())
}

// ── Frame decoding ────────────────────────────────────────────

fn verify_checksum(frame: &[u8; FRAME_LEN]) -> Result<(), SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    if sum == frame[4] {
        Ok(())
    } else {
        Err(SensorError::ChecksumMismatch)
    }
}

fn checked(temperature_c: f32, humidity_pct: f32, t_range: (f32, f32)) -> Result<AmbientReading, SensorError> {
    if !(0.0..=100.0).contains(&humidity_pct) || !(t_range.0..=t_range.1).contains(&temperature_c) {
        return Err(SensorError::OutOfRange);
    }
    Ok(AmbientReading {
        temperature_c: Some(temperature_c),
        humidity_pct: Some(humidity_pct),
    })
}

/// DHT22 / AM2302: 16-bit humidity and sign-magnitude temperature, both
/// in tenths.
pub fn decode_dht22(frame: &[u8; FRAME_LEN]) -> Result<AmbientReading, SensorError> {
    verify_checksum(frame)?;
    let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
    let magnitude = f32::from(u16::from_be_bytes([frame[2] & 0x7F, frame[3]])) / 10.0;
    let temperature = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
    checked(temperature, humidity, (-40.0, 80.0))
}

/// DHT11: integral and decimal bytes; newer parts flag negative
/// temperatures in bit 7 of the decimal byte.
pub fn decode_dht11(frame: &[u8; FRAME_LEN]) -> Result<AmbientReading, SensorError> {
    verify_checksum(frame)?;
    let humidity = f32::from(frame[0]) + f32::from(frame[1]) / 10.0;
    let magnitude = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) / 10.0;
    let temperature = if frame[3] & 0x80 != 0 { -magnitude } else { magnitude };
    checked(temperature, humidity, (-20.0, 60.0))
}

pub fn decode(kind: HumiditySensor, frame: &[u8; FRAME_LEN]) -> Result<AmbientReading, SensorError> {
    match kind {
        HumiditySensor::Dht11 => decode_dht11(frame),
        HumiditySensor::Dht22 => decode_dht22(frame),
    }
}

/// Start pulse length and minimum interval between samples.
pub const fn timing_ms(kind: HumiditySensor) -> (u32, u32) {
    match kind {
        HumiditySensor::Dht11 => (18, 1_000),
        HumiditySensor::Dht22 => (2, 2_000),
    }
}

// ── Bus transaction ───────────────────────────────────────────

/// Poll until the line reaches `high`, returning the µs spent waiting.
fn wait_for<P, D>(pin: &mut P, delay: &mut D, high: bool) -> Result<u32, SensorError>
where
    P: InputPin,
    D: DelayNs,
{
    let mut waited = 0;
    while pin.is_high().map_err(|_| SensorError::Bus)? != high {
        if waited >= EDGE_TIMEOUT_US {
            return Err(SensorError::Timeout);
        }
        delay.delay_us(1);
        waited += 1;
    }
    Ok(waited)
}

/// Run one handshake and clock in a raw frame.
pub fn read_frame<P, D>(pin: &mut P, delay: &mut D, start_ms: u32) -> Result<[u8; FRAME_LEN], SensorError>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pin.set_low().map_err(|_| SensorError::Bus)?;
    delay.delay_ms(start_ms);
    pin.set_high().map_err(|_| SensorError::Bus)?;

    // Response: sensor pulls low ~80 µs, then high ~80 µs.
    wait_for(pin, delay, false)?;
    wait_for(pin, delay, true)?;
    wait_for(pin, delay, false)?;

    let mut frame = [0u8; FRAME_LEN];
    for bit in 0..FRAME_LEN * 8 {
        wait_for(pin, delay, true)?;
        let high_us = wait_for(pin, delay, false)?;
        if high_us > ONE_THRESHOLD_US {
            frame[bit / 8] |= 0x80 >> (bit % 8);
        }
    }
    Ok(frame)
}

// ── Sensor ────────────────────────────────────────────────────

pub struct AmbientSensor {
    kind: HumiditySensor,
    #[cfg(target_os = "espidf")]
    pin: crate::drivers::hw_init::OpenDrainPin,
    #[cfg(target_os = "espidf")]
    cached: Option<(u32, AmbientReading)>,
}

impl AmbientSensor {
    pub fn new(gpio: i32, kind: HumiditySensor) -> Self {
        #[cfg(not(target_os = "espidf"))]
        let _ = gpio;
        Self {
            kind,
            #[cfg(target_os = "espidf")]
            pin: crate::drivers::hw_init::OpenDrainPin(gpio),
            #[cfg(target_os = "espidf")]
            cached: None,
        }
    }

    pub fn kind(&self) -> HumiditySensor {
        self.kind
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> Result<AmbientReading, SensorError> {
        let (start_ms, interval_ms) = timing_ms(self.kind);
        let now = crate::adapters::time::uptime_ms();
        if let Some((at, reading)) = self.cached {
            if now.wrapping_sub(at) < interval_ms {
                return Ok(reading);
            }
        }
        let mut delay = esp_idf_hal::delay::Ets;
        let frame = read_frame(&mut self.pin, &mut delay, start_ms)?;
        let reading = decode(self.kind, &frame)?;
        self.cached = Some((now, reading));
        Ok(reading)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> Result<AmbientReading, SensorError> {
        let reading = AmbientReading {
            temperature_c: load(&SIM_TEMP),
            humidity_pct: load(&SIM_HUMIDITY),
        };
        if reading == AmbientReading::default() {
            return Err(SensorError::Timeout);
        }
        Ok(reading)
    }
}
