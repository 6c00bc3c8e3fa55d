//! Fixed-size on-EEPROM configuration record.
//!
//! ```text
//!  0      2                                   32
//!  ┌──────┬───────────────────────────────────┐
//!  │marker│ postcard(DewConfig) + zero padding │
//!  └──────┴───────────────────────────────────┘
//!   u16 LE: 99 = valid, 0 = invalidated
//! ```
//!
//! The marker is the only integrity check.  A damaged body behind a valid
//! marker is accepted if it still decodes.

use crate::app::ports::ConfigError;
use crate::config::DewConfig;

pub const RECORD_SIZE: usize = 32;
pub const MARKER_LEN: usize = 2;
pub const VALID_MARKER: u16 = 99;
pub const INVALID_MARKER: u16 = 0;

/// Serialise `config` into a full record carrying the valid marker.
pub fn encode(config: &DewConfig) -> Result<[u8; RECORD_SIZE], ConfigError> {
    let mut buf = [0u8; RECORD_SIZE];
    buf[..MARKER_LEN].copy_from_slice(&VALID_MARKER.to_le_bytes());
    postcard::to_slice(config, &mut buf[MARKER_LEN..]).map_err(|_| ConfigError::Encode)?;
    Ok(buf)
}

/// Decode the body of a record.  The marker is not checked here.
pub fn decode(record: &[u8]) -> Result<DewConfig, ConfigError> {
    let body = record.get(MARKER_LEN..).ok_or(ConfigError::Corrupted)?;
    postcard::from_bytes(body).map_err(|_| ConfigError::Corrupted)
}

/// Marker word at the start of `record` (0 if the slice is too short).
pub fn marker(record: &[u8]) -> u16 {
    match record {
        [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]),
        _ => INVALID_MARKER,
    }
}
