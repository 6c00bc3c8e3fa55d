//! Display paging contract.
//!
//! The core only decides which page is due and assembles a read-only
//! [`DisplaySnapshot`]; the [`DisplaySink`](crate::app::ports::DisplaySink)
//! adapter renders it.  Pages rotate in a fixed order every configured
//! page duration.

use crate::config::{DisplayUnit, ShadowMode, TrackingMode};
use crate::control::channels::ChannelState;
use crate::control::dewpoint::AmbientSample;
use crate::control::policy::PowerLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayPage {
    /// Ambient temperature, humidity, dew point.
    #[default]
    Environment,
    /// Per-channel temperature, power and calibration offset.
    Channels,
    /// Tracking mode, offsets, shadow mode, fan and board temperature.
    System,
}

impl DisplayPage {
    pub fn next(self) -> Self {
        match self {
            Self::Environment => Self::Channels,
            Self::Channels => Self::System,
            Self::System => Self::Environment,
        }
    }
}

/// Everything a page may show, taken at the moment the page is due.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    pub ambient: AmbientSample,
    pub channels: [ChannelState; 3],
    pub channel_offsets: [f32; 3],
    pub tracking_mode: TrackingMode,
    pub offset: i8,
    pub ambient_bias: i8,
    pub shadow_mode: ShadowMode,
    pub fan_speed: PowerLevel,
    pub board_temp_c: Option<f32>,
    pub unit: DisplayUnit,
}

impl DisplaySnapshot {
    /// Convert a Celsius value to the configured display unit.
    pub fn in_unit(&self, celsius: f32) -> f32 {
        match self.unit {
            DisplayUnit::Celsius => celsius,
            DisplayUnit::Fahrenheit => to_fahrenheit(celsius),
        }
    }

    pub fn unit_symbol(&self) -> char {
        match self.unit {
            DisplayUnit::Celsius => 'C',
            DisplayUnit::Fahrenheit => 'F',
        }
    }
}

pub fn to_fahrenheit(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

/// Tracks which page is shown next.
#[derive(Debug, Clone, Default)]
pub struct PageRotation {
    next: DisplayPage,
}

impl PageRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page to show now; the rotation moves on to the following one.
    pub fn advance(&mut self) -> DisplayPage {
        let page = self.next;
        self.next = page.next();
        page
    }
}
