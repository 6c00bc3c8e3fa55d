//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DewController (domain)
//! ```
//!
//! Driven adapters (probes, heaters, EEPROM, serial links, display) implement
//! these traits.  The [`DewController`](super::service::DewController) takes
//! them as generic parameters at each call, so the domain core never touches
//! hardware directly.

use crate::config::DewConfig;
use crate::control::channels::{ChannelId, SwitchState};
use crate::control::policy::PowerLevel;
use crate::display::{DisplayPage, DisplaySnapshot};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw ambient sensor output.  `None` marks a quantity the sensor could
/// not deliver this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbientReading {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
}

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Whether a temperature probe answered on the channel's bus.
    fn probe_present(&mut self, channel: ChannelId) -> bool;

    /// Start a conversion on the channel 1/2 probes and the board probe.
    fn request_conversions(&mut self);

    /// Start a conversion on a single channel probe.
    fn request_probe_conversion(&mut self, channel: ChannelId);

    /// Last converted probe temperature (°C, uncalibrated).
    fn read_probe(&mut self, channel: ChannelId) -> Option<f32>;

    /// Controller board temperature (°C).
    fn read_board_temp(&mut self) -> Option<f32>;

    fn read_ambient(&mut self) -> AmbientReading;

    /// Current position of the manual override switches.
    fn read_switches(&mut self) -> SwitchState;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Set the 8-bit PWM duty of a heater output.
    fn set_heater_duty(&mut self, channel: ChannelId, duty: u8);

    /// Drive the fan and its status indicator at `speed`.
    fn set_fan(&mut self, speed: PowerLevel);

    /// All heaters and the fan off.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → rendering)
// ───────────────────────────────────────────────────────────────

/// External rendering collaborator.  The core decides *what* page is due
/// and hands over a snapshot; how it is drawn is up to the adapter.
pub trait DisplaySink {
    fn set_enabled(&mut self, enabled: bool);

    fn show(&mut self, page: DisplayPage, snapshot: &DisplaySnapshot);
}

// ───────────────────────────────────────────────────────────────
// Response port (driven adapter: domain → command transports)
// ───────────────────────────────────────────────────────────────

/// Destination for query replies.  Implementations broadcast to every
/// attached transport.
pub trait ResponseSink {
    fn send(&mut self, response: &str);
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn send(&mut self, response: &str) {
        (**self).send(response);
    }
}

/// An absent transport swallows replies.
impl<S: ResponseSink> ResponseSink for Option<S> {
    fn send(&mut self, response: &str) {
        if let Some(sink) = self {
            sink.send(response);
        }
    }
}

impl<A: ResponseSink, B: ResponseSink> ResponseSink for (A, B) {
    fn send(&mut self, response: &str) {
        self.0.send(response);
        self.1.send(response);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain → persistent config)
// ───────────────────────────────────────────────────────────────

/// Persists the active configuration record.
pub trait ConfigPort {
    fn save(&mut self, config: &DewConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// EEPROM port (driven adapter: config store → byte region)
// ───────────────────────────────────────────────────────────────

/// A fixed-size, byte-addressable persistent region.
pub trait EepromPort {
    /// Region size in bytes.
    fn capacity(&self) -> usize;

    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored record body failed to deserialize.
    Corrupted,
    /// Configuration does not fit in a record.
    Encode,
    /// Region is smaller than one record.
    NoSlots,
    /// Underlying EEPROM access failed.
    Storage(StorageError),
}

/// Errors from [`EepromPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Address range lies outside the region.
    OutOfBounds,
    /// Backend I/O failure (driver return code).
    Io(i32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::Encode => write!(f, "config does not fit record"),
            Self::NoSlots => write!(f, "region too small for a record"),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "address out of bounds"),
            Self::Io(rc) => write!(f, "I/O error (rc={})", rc),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}
