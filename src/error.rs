//! Unified error types for the dew controller firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot path's error handling uniform.  All variants are `Copy`; nothing
//! here allocates.

use core::fmt;

pub use crate::app::ports::{ConfigError, StorageError};
pub use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned corrupt data.
    Sensor(SensorError),
    /// The persistence backend failed.
    Storage(StorageError),
    /// The configuration record could not be loaded or saved.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No device answered the bus reset.
    NoPresence,
    /// DS18B20 scratchpad failed its CRC-8.
    CrcMismatch,
    /// DHT frame failed its additive checksum.
    ChecksumMismatch,
    /// The sensor stopped toggling the data line mid-frame.
    Timeout,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// The data GPIO could not be driven or sampled.
    Bus,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::CrcMismatch => write!(f, "scratchpad CRC mismatch"),
            Self::ChecksumMismatch => write!(f, "frame checksum mismatch"),
            Self::Timeout => write!(f, "bus timeout"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Bus => write!(f, "GPIO access failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
