//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.  Sensor values are
//! plain fields the test sets before each loop pass.

use dewctrl::app::ports::{
    ActuatorPort, AmbientReading, ConfigError, ConfigPort, DisplaySink, ResponseSink, SensorPort,
};
use dewctrl::config::DewConfig;
use dewctrl::control::channels::{ChannelId, SwitchState};
use dewctrl::control::policy::PowerLevel;
use dewctrl::display::{DisplayPage, DisplaySnapshot};
use embedded_hal::delay::DelayNs;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    HeaterDuty(ChannelId, u8),
    Fan(PowerLevel),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub present: [bool; 3],
    pub probes: [Option<f32>; 3],
    pub board: Option<f32>,
    pub ambient: AmbientReading,
    pub switches: SwitchState,
    /// Shared conversion requests (ch1, ch2, board).
    pub shared_requests: u32,
    /// Single-probe conversion requests.
    pub single_requests: Vec<ChannelId>,
    pub probe_reads: Vec<ChannelId>,
    pub switch_reads: u32,
    pub delayed_ns: u64,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            present: [false; 3],
            probes: [None; 3],
            board: None,
            ambient: AmbientReading::default(),
            switches: SwitchState::None,
            shared_requests: 0,
            single_requests: Vec::new(),
            probe_reads: Vec::new(),
            switch_reads: 0,
            delayed_ns: 0,
        }
    }

    /// Probe fitted on `id` reading `celsius`.
    pub fn with_probe(mut self, id: ChannelId, celsius: f32) -> Self {
        self.present[id.index()] = true;
        self.probes[id.index()] = Some(celsius);
        self
    }

    pub fn with_ambient(mut self, temperature_c: f32, humidity_pct: f32) -> Self {
        self.ambient = AmbientReading {
            temperature_c: Some(temperature_c),
            humidity_pct: Some(humidity_pct),
        };
        self
    }

    /// Last duty written to a heater, 0 after an `all_off`.
    pub fn heater_duty(&self, id: ChannelId) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::HeaterDuty(ch, d) if *ch == id => Some(*d),
            ActuatorCall::AllOff => Some(0),
            _ => None,
        })
    }

    pub fn fan(&self) -> Option<PowerLevel> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::Fan(s) => Some(*s),
            ActuatorCall::AllOff => Some(PowerLevel::Off),
            _ => None,
        })
    }

    pub fn delayed_ms(&self) -> u64 {
        self.delayed_ns / 1_000_000
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn probe_present(&mut self, channel: ChannelId) -> bool {
        self.present[channel.index()]
    }

    fn request_conversions(&mut self) {
        self.shared_requests += 1;
    }

    fn request_probe_conversion(&mut self, channel: ChannelId) {
        self.single_requests.push(channel);
    }

    fn read_probe(&mut self, channel: ChannelId) -> Option<f32> {
        self.probe_reads.push(channel);
        self.probes[channel.index()]
    }

    fn read_board_temp(&mut self) -> Option<f32> {
        self.board
    }

    fn read_ambient(&mut self) -> AmbientReading {
        self.ambient
    }

    fn read_switches(&mut self) -> SwitchState {
        self.switch_reads += 1;
        self.switches
    }
}

impl ActuatorPort for MockHardware {
    fn set_heater_duty(&mut self, channel: ChannelId, duty: u8) {
        self.calls.push(ActuatorCall::HeaterDuty(channel, duty));
    }

    fn set_fan(&mut self, speed: PowerLevel) {
        self.calls.push(ActuatorCall::Fan(speed));
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

impl DelayNs for MockHardware {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += u64::from(ns);
    }
}

// ── MockConfigStore ───────────────────────────────────────────

/// Keeps every saved configuration.
#[derive(Default)]
pub struct MockConfigStore {
    pub saved: Vec<DewConfig>,
    pub fail: bool,
}

#[allow(dead_code)]
impl MockConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&DewConfig> {
        self.saved.last()
    }
}

impl ConfigPort for MockConfigStore {
    fn save(&mut self, config: &DewConfig) -> Result<(), ConfigError> {
        if self.fail {
            return Err(ConfigError::NoSlots);
        }
        self.saved.push(config.clone());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub replies: Vec<String>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&str> {
        self.replies.last().map(String::as_str)
    }
}

impl ResponseSink for RecordingSink {
    fn send(&mut self, response: &str) {
        self.replies.push(response.to_string());
    }
}

// ── RecordingDisplay ──────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDisplay {
    pub enabled: bool,
    pub pages: Vec<DisplayPage>,
    pub last_snapshot: Option<DisplaySnapshot>,
}

#[allow(dead_code)]
impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for RecordingDisplay {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn show(&mut self, page: DisplayPage, snapshot: &DisplaySnapshot) {
        self.pages.push(page);
        self.last_snapshot = Some(snapshot.clone());
    }
}
