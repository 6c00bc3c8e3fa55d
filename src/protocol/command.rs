//! Command parser.
//!
//! A frame is a single code byte, an optional parameter and the `#`
//! terminator.  Numeric parameters are read leniently: leading whitespace
//! and a sign are accepted, parsing stops at the first invalid character,
//! and a parameter with no digits reads as 0.  Range checking is not done
//! here; every setter clamps.

use crate::config::{DisplayUnit, ShadowMode, TrackingMode};
use crate::control::channels::ChannelId;
use crate::protocol::frame::TERMINATOR;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    // ── Queries ───────────────────────────────────────────────
    GetVersion,
    GetChannelOffsets,
    GetShadowMode,
    GetProbeCount,
    GetTrackingMode,
    GetFanSpeed,
    GetAmbient,
    GetHumidity,
    GetDewPoint,
    GetTemperatures,
    GetPowers,
    GetAmbientBias,
    GetPageDuration,
    GetDisplayUnit,
    GetOffset,
    GetFanOnThreshold,
    GetBoardTemp,
    GetFanOffThreshold,

    // ── Mutations ─────────────────────────────────────────────
    Override(ChannelId),
    ReleaseOverrides,
    SetTrackingMode(TrackingMode),
    SetDisplayUnit(DisplayUnit),
    DecrementOffset,
    IncrementOffset,
    ZeroOffset,
    SetFanSpeed(i32),
    SetFanOnThreshold(i32),
    SetFanOffThreshold(i32),
    SetAmbientBias(i32),
    WriteConfig,
    SetChannelOffset(ChannelId, f32),
    ClearChannelOffsets,
    DisplayOff,
    DisplayOn,
    SetShadowMode(ShadowMode),
    SetManualPower(i32),
    SetPageDuration(i32),
    FactoryReset,
}

impl Command {
    /// Parse a complete frame.  Returns `None` for a bare terminator or an
    /// unknown command code.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let body = frame.strip_suffix(&[TERMINATOR]).unwrap_or(frame);
        let (&code, param) = body.split_first()?;
        let param = core::str::from_utf8(param).unwrap_or("");

        let cmd = match code {
            b'v' => Self::GetVersion,
            b'?' => Self::GetChannelOffsets,
            b'E' => Self::GetShadowMode,
            b'g' => Self::GetProbeCount,
            b'T' => Self::GetTrackingMode,
            b'F' => Self::GetFanSpeed,
            b'A' => Self::GetAmbient,
            b'R' => Self::GetHumidity,
            b'D' => Self::GetDewPoint,
            b'C' => Self::GetTemperatures,
            b'W' => Self::GetPowers,
            b'B' => Self::GetAmbientBias,
            b'H' => Self::GetPageDuration,
            b'h' => Self::GetDisplayUnit,
            b'y' => Self::GetOffset,
            b'J' => Self::GetFanOnThreshold,
            b'K' => Self::GetBoardTemp,
            b'L' => Self::GetFanOffThreshold,

            b'1' => Self::Override(ChannelId::Ch1),
            b'2' => Self::Override(ChannelId::Ch2),
            b'n' => Self::ReleaseOverrides,
            b'a' => Self::SetTrackingMode(TrackingMode::from_code(parse_int(param))),
            b'c' => Self::SetDisplayUnit(DisplayUnit::Celsius),
            b'f' => Self::SetDisplayUnit(DisplayUnit::Fahrenheit),
            b'<' => Self::DecrementOffset,
            b'>' => Self::IncrementOffset,
            b'z' => Self::ZeroOffset,
            b's' => Self::SetFanSpeed(parse_int(param)),
            b'I' => Self::SetFanOnThreshold(parse_int(param)),
            b'M' => Self::SetFanOffThreshold(parse_int(param)),
            b'e' => Self::SetAmbientBias(parse_int(param)),
            b'w' => Self::WriteConfig,
            b'[' => Self::SetChannelOffset(ChannelId::Ch1, parse_float(param)),
            b']' => Self::SetChannelOffset(ChannelId::Ch2, parse_float(param)),
            b'%' => Self::SetChannelOffset(ChannelId::Ch3, parse_float(param)),
            b'&' => Self::ClearChannelOffsets,
            b'{' => Self::DisplayOff,
            b'}' => Self::DisplayOn,
            b'S' => Self::SetShadowMode(ShadowMode::from_code(parse_int(param))),
            b'G' => Self::SetManualPower(parse_int(param)),
            b'b' => Self::SetPageDuration(parse_int(param)),
            b'r' => Self::FactoryReset,
            _ => return None,
        };
        Some(cmd)
    }

    /// Whether the command produces a reply.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::GetVersion
                | Self::GetChannelOffsets
                | Self::GetShadowMode
                | Self::GetProbeCount
                | Self::GetTrackingMode
                | Self::GetFanSpeed
                | Self::GetAmbient
                | Self::GetHumidity
                | Self::GetDewPoint
                | Self::GetTemperatures
                | Self::GetPowers
                | Self::GetAmbientBias
                | Self::GetPageDuration
                | Self::GetDisplayUnit
                | Self::GetOffset
                | Self::GetFanOnThreshold
                | Self::GetBoardTemp
                | Self::GetFanOffThreshold
        )
    }
}

/// Split off an optional sign and the run of digits that follows.
fn numeric_prefix(s: &str, allow_fraction: bool) -> &str {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => {}
            b'.' if allow_fraction && !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    &s[..end]
}

/// Lenient integer: `"42abc"` → 42, `"abc"` → 0.  Saturates on overflow.
pub fn parse_int(s: &str) -> i32 {
    let digits = numeric_prefix(s, false);
    let (negative, magnitude) = match digits.as_bytes().first() {
        Some(b'-') => (true, &digits[1..]),
        Some(b'+') => (false, &digits[1..]),
        _ => (false, digits),
    };
    let value = magnitude.bytes().fold(0i64, |acc, d| {
        (acc * 10 + i64::from(d - b'0')).min(i64::from(i32::MAX) + 1)
    });
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Lenient decimal: `"1.25x"` → 1.25, `"x"` → 0.0.  Never non-finite.
pub fn parse_float(s: &str) -> f32 {
    numeric_prefix(s, true)
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
