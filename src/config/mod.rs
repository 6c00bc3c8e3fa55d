//! User-tunable configuration.
//!
//! [`DewConfig`] is the single persisted record.  Every bounded field is
//! private and only reachable through a clamping setter, so an
//! out-of-range value can never be stored, whatever the command channel
//! sends.  [`HardwareProfile`] is the runtime stand-in for board-variant
//! build options (probe resolution, humidity sensor type, Bluetooth).

pub mod record;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::control::channels::ChannelId;
use crate::control::policy::PowerLevel;

pub use store::{BootRecord, ConfigStore};

// ── Bounds ────────────────────────────────────────────────────

pub const OFFSET_MIN: i8 = -4;
pub const OFFSET_MAX: i8 = 3;
pub const BIAS_MIN: i8 = -4;
pub const BIAS_MAX: i8 = 3;
pub const PAGE_DURATION_MIN_MS: u16 = 2000;
pub const PAGE_DURATION_MAX_MS: u16 = 5000;
pub const PAGE_DURATION_DEFAULT_MS: u16 = 2500;
/// Upper bound for fan thresholds and any percentage parameter.
pub const PERCENT_MAX: u8 = 100;
/// Largest calibration correction accepted for a single probe (°C).
pub const CHANNEL_OFFSET_LIMIT: f32 = 10.0;
/// Gap kept between the fan-on and fan-off thresholds when the user sets
/// an off threshold that would overlap.
pub const FAN_HYSTERESIS_GAP_C: u8 = 2;

// ── Enumerations ──────────────────────────────────────────────

/// Reference strategy for the power policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrackingMode {
    /// Unrecognised mode code; every channel stays off.
    Disabled = 0,
    Ambient = 1,
    #[default]
    DewPoint = 2,
    Halfway = 3,
}

impl TrackingMode {
    /// Decode a protocol mode code.  Only the low two bits are significant.
    pub fn from_code(code: i32) -> Self {
        match code & 0x03 {
            1 => Self::Ambient,
            2 => Self::DewPoint,
            3 => Self::Halfway,
            _ => Self::Disabled,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Behaviour of the third heater channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShadowMode {
    #[default]
    Off = 0,
    ShadowCh1 = 1,
    ShadowCh2 = 2,
    Manual = 3,
    OwnProbe = 4,
}

impl ShadowMode {
    /// Decode a protocol shadow code.  Only the low three bits are
    /// significant; codes 5–7 fall back to `Off`.
    pub fn from_code(code: i32) -> Self {
        match code & 0x07 {
            1 => Self::ShadowCh1,
            2 => Self::ShadowCh2,
            3 => Self::Manual,
            4 => Self::OwnProbe,
            _ => Self::Off,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DisplayUnit {
    #[default]
    Celsius = 1,
    Fahrenheit = 2,
}

impl DisplayUnit {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

// ── Persisted configuration ───────────────────────────────────

/// The persisted configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DewConfig {
    tracking_mode: TrackingMode,
    /// Global offset applied to every policy threshold (°C).
    offset: i8,
    fan_speed: PowerLevel,
    /// Board temperature that latches the fan on (°C, 0 = no temperature control).
    fan_on_c: u8,
    /// Board temperature below which a latched fan is released (°C).
    fan_off_c: u8,
    /// Calibration added to the ambient temperature (°C).
    ambient_bias: i8,
    channel_offsets: [f32; 3],
    shadow_mode: ShadowMode,
    display_unit: DisplayUnit,
    page_duration_ms: u16,
}

impl Default for DewConfig {
    fn default() -> Self {
        Self {
            tracking_mode: TrackingMode::DewPoint,
            offset: 0,
            fan_speed: PowerLevel::Off,
            fan_on_c: 0,
            fan_off_c: 0,
            ambient_bias: 0,
            channel_offsets: [0.0; 3],
            shadow_mode: ShadowMode::Off,
            display_unit: DisplayUnit::Celsius,
            page_duration_ms: PAGE_DURATION_DEFAULT_MS,
        }
    }
}

fn clamp_i8(value: i32, min: i8, max: i8) -> i8 {
    value.clamp(i32::from(min), i32::from(max)) as i8
}

fn clamp_channel_offset(offset: f32) -> f32 {
    if offset.is_finite() {
        offset.clamp(-CHANNEL_OFFSET_LIMIT, CHANNEL_OFFSET_LIMIT)
    } else {
        0.0
    }
}

fn clamp_percent(value: i32) -> u8 {
    value.clamp(0, i32::from(PERCENT_MAX)) as u8
}

impl DewConfig {
    // ── Getters ───────────────────────────────────────────────

    pub fn tracking_mode(&self) -> TrackingMode {
        self.tracking_mode
    }

    pub fn offset(&self) -> i8 {
        self.offset
    }

    pub fn fan_speed(&self) -> PowerLevel {
        self.fan_speed
    }

    pub fn fan_on_c(&self) -> u8 {
        self.fan_on_c
    }

    pub fn fan_off_c(&self) -> u8 {
        self.fan_off_c
    }

    /// `true` when the fan is driven by board temperature rather than the
    /// fixed speed setting.
    pub fn fan_temperature_controlled(&self) -> bool {
        self.fan_on_c > 0
    }

    pub fn ambient_bias(&self) -> i8 {
        self.ambient_bias
    }

    pub fn channel_offset(&self, channel: ChannelId) -> f32 {
        self.channel_offsets[channel.index()]
    }

    pub fn channel_offsets(&self) -> [f32; 3] {
        self.channel_offsets
    }

    pub fn shadow_mode(&self) -> ShadowMode {
        self.shadow_mode
    }

    pub fn display_unit(&self) -> DisplayUnit {
        self.display_unit
    }

    pub fn page_duration_ms(&self) -> u16 {
        self.page_duration_ms
    }

    // ── Clamping setters ──────────────────────────────────────

    pub fn set_tracking_mode(&mut self, mode: TrackingMode) {
        self.tracking_mode = mode;
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.offset = clamp_i8(offset, OFFSET_MIN, OFFSET_MAX);
    }

    pub fn adjust_offset(&mut self, delta: i32) {
        self.set_offset(i32::from(self.offset).saturating_add(delta));
    }

    /// Clamp to 0–100 and snap down to a supported fan level.
    pub fn set_fan_speed(&mut self, pct: i32) -> PowerLevel {
        self.fan_speed = PowerLevel::floor_percent(pct);
        self.fan_speed
    }

    /// Setting the on-threshold to 0 hands the fan back to the fixed speed
    /// setting and stops it.
    pub fn set_fan_on_threshold(&mut self, celsius: i32) {
        self.fan_on_c = clamp_percent(celsius);
        if self.fan_on_c == 0 {
            self.fan_speed = PowerLevel::Off;
        }
    }

    /// The off-threshold is kept strictly below the on-threshold.
    pub fn set_fan_off_threshold(&mut self, celsius: i32) {
        let off = clamp_percent(celsius);
        self.fan_off_c = if off >= self.fan_on_c {
            self.fan_on_c.saturating_sub(FAN_HYSTERESIS_GAP_C)
        } else {
            off
        };
    }

    pub fn set_ambient_bias(&mut self, bias: i32) {
        self.ambient_bias = clamp_i8(bias, BIAS_MIN, BIAS_MAX);
    }

    /// Clamped to ±[`CHANNEL_OFFSET_LIMIT`]; non-finite offsets are stored
    /// as 0.0.
    pub fn set_channel_offset(&mut self, channel: ChannelId, offset: f32) {
        self.channel_offsets[channel.index()] = clamp_channel_offset(offset);
    }

    pub fn clear_channel_offsets(&mut self) {
        self.channel_offsets = [0.0; 3];
    }

    pub fn set_shadow_mode(&mut self, mode: ShadowMode) {
        self.shadow_mode = mode;
    }

    pub fn set_display_unit(&mut self, unit: DisplayUnit) {
        self.display_unit = unit;
    }

    pub fn set_page_duration_ms(&mut self, ms: i32) {
        self.page_duration_ms = ms.clamp(
            i32::from(PAGE_DURATION_MIN_MS),
            i32::from(PAGE_DURATION_MAX_MS),
        ) as u16;
    }

    /// Re-apply every bound to a record that came from storage.
    ///
    /// Returns `true` if any field changed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.clone();

        self.set_offset(i32::from(self.offset));
        self.set_ambient_bias(i32::from(self.ambient_bias));
        self.fan_on_c = self.fan_on_c.min(PERCENT_MAX);
        self.fan_off_c = self.fan_off_c.min(PERCENT_MAX);
        if self.fan_on_c == 0 {
            self.fan_speed = PowerLevel::Off;
        }
        for o in &mut self.channel_offsets {
            *o = clamp_channel_offset(*o);
        }
        self.set_page_duration_ms(i32::from(self.page_duration_ms));

        *self != before
    }
}

// ── Hardware profile ──────────────────────────────────────────

/// Ambient humidity/temperature sensor fitted to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HumiditySensor {
    Dht11,
    #[default]
    Dht22,
}

/// Board-variant options selected at start-up rather than compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareProfile {
    /// DS18B20 conversion resolution, 9–12 bits.
    pub probe_resolution_bits: u8,
    pub humidity_sensor: HumiditySensor,
    /// A Bluetooth serial module is fitted on the second UART.
    pub bluetooth: bool,
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self {
            probe_resolution_bits: 10,
            humidity_sensor: HumiditySensor::Dht22,
            bluetooth: true,
        }
    }
}

impl HardwareProfile {
    pub fn resolution_bits(&self) -> u8 {
        self.probe_resolution_bits.clamp(9, 12)
    }

    /// Wait between a probe conversion request and its read-back: 600 ms
    /// at 12 bits, halving for every bit removed.
    pub fn conversion_delay_ms(&self) -> u32 {
        600 / (1 << (12 - u32::from(self.resolution_bits())))
    }
}
