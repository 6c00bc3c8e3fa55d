//! Three-channel heater controller.
//!
//! Channels 1 and 2 are independent: forced to 100 % while overridden,
//! otherwise driven by the power policy.  Channel 3 is the *shadow*
//! channel and derives its values from [`ShadowMode`]:
//!
//! | Mode      | Temperature        | Power                   |
//! |-----------|--------------------|-------------------------|
//! | Off       | 0                  | 0                       |
//! | ShadowCh1 | ch1 (this cycle)   | ch1 (this cycle)        |
//! | ShadowCh2 | ch2 (this cycle)   | ch2 (this cycle)        |
//! | Manual    | 0                  | remembered manual power |
//! | OwnProbe  | own probe + offset | policy, 0 without probe |
//!
//! Channel 3 is always resolved after channels 1 and 2 are final.

use log::info;

use crate::config::{DewConfig, ShadowMode};
use crate::control::dewpoint::AmbientSample;
use crate::control::policy::{PowerLevel, percent_to_duty, power_for_sample};

const OVERRIDE_POWER: u8 = PowerLevel::Full.percent();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Ch1,
    Ch2,
    Ch3,
}

impl ChannelId {
    pub const ALL: [Self; 3] = [Self::Ch1, Self::Ch2, Self::Ch3];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Position of the two manual override toggle switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchState {
    #[default]
    None,
    Sw1,
    Sw2,
    Both,
}

impl SwitchState {
    pub fn ch1(self) -> bool {
        matches!(self, Self::Sw1 | Self::Both)
    }

    pub fn ch2(self) -> bool {
        matches!(self, Self::Sw2 | Self::Both)
    }
}

/// Runtime state of one output channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    /// Calibrated temperature, 0.0 when there is no valid reading.
    pub temperature_c: f32,
    /// The temperature above came from a successful probe read.
    pub sample_valid: bool,
    /// Power percentage, one of the policy levels or a manual value.
    pub power: u8,
    pub override_active: bool,
    pub probe_present: bool,
}

impl ChannelState {
    fn clear(&mut self) {
        self.temperature_c = 0.0;
        self.sample_valid = false;
        self.power = 0;
    }
}

#[derive(Debug, Clone)]
pub struct ChannelBank {
    channels: [ChannelState; 3],
    /// Last explicitly set channel-3 manual power, kept across mode changes.
    manual_power: u8,
    /// A remote `1`/`2` override is in force; switch polling is suspended.
    remote_override: bool,
}

impl Default for ChannelBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBank {
    pub fn new() -> Self {
        Self {
            channels: [ChannelState::default(); 3],
            manual_power: 0,
            remote_override: false,
        }
    }

    pub fn channel(&self, id: ChannelId) -> &ChannelState {
        &self.channels[id.index()]
    }

    pub fn channels(&self) -> &[ChannelState; 3] {
        &self.channels
    }

    pub fn set_probe_present(&mut self, id: ChannelId, present: bool) {
        self.channels[id.index()].probe_present = present;
    }

    /// Number of channel probes detected.
    pub fn probe_count(&self) -> u8 {
        self.channels.iter().filter(|c| c.probe_present).count() as u8
    }

    pub fn remote_override(&self) -> bool {
        self.remote_override
    }

    pub fn manual_power(&self) -> u8 {
        self.manual_power
    }

    /// 8-bit PWM duty for every channel.
    pub fn duties(&self) -> [u8; 3] {
        self.channels.map(|c| percent_to_duty(c.power))
    }

    // ── Acquisition cycle ─────────────────────────────────────

    /// Recompute every channel from this cycle's uncalibrated probe
    /// readings (indexed by channel).
    pub fn update(&mut self, raw: [Option<f32>; 3], config: &DewConfig, ambient: &AmbientSample) {
        for id in [ChannelId::Ch1, ChannelId::Ch2] {
            self.update_from_probe(id, raw[id.index()], config, ambient);
        }

        let mode = config.shadow_mode();
        if mode == ShadowMode::OwnProbe {
            self.update_from_probe(ChannelId::Ch3, raw[ChannelId::Ch3.index()], config, ambient);
        } else {
            self.resolve_shadow(mode);
        }
    }

    fn update_from_probe(
        &mut self,
        id: ChannelId,
        raw: Option<f32>,
        config: &DewConfig,
        ambient: &AmbientSample,
    ) {
        let offset = config.channel_offset(id);
        let ch = &mut self.channels[id.index()];

        let reading = raw
            .filter(|t| ch.probe_present && t.is_finite())
            .map(|t| t + offset);
        ch.temperature_c = reading.unwrap_or(0.0);
        ch.sample_valid = reading.is_some();

        ch.power = if ch.override_active && ch.probe_present {
            OVERRIDE_POWER
        } else {
            power_for_sample(reading, config.tracking_mode(), ambient, config.offset()).percent()
        };
    }

    /// Apply a newly selected shadow mode straight away, using the current
    /// channel 1/2 values.  `OwnProbe` needs a fresh reading and is left to
    /// the next acquisition cycle.
    pub fn apply_shadow_mode(&mut self, mode: ShadowMode) {
        if mode != ShadowMode::OwnProbe {
            self.resolve_shadow(mode);
        }
    }

    fn resolve_shadow(&mut self, mode: ShadowMode) {
        let [ch1, ch2, ch3] = &mut self.channels;
        match mode {
            ShadowMode::Off => ch3.clear(),
            ShadowMode::ShadowCh1 => Self::mirror(ch3, ch1),
            ShadowMode::ShadowCh2 => Self::mirror(ch3, ch2),
            ShadowMode::Manual => {
                ch3.clear();
                ch3.power = self.manual_power;
            }
            ShadowMode::OwnProbe => {}
        }
    }

    fn mirror(dst: &mut ChannelState, src: &ChannelState) {
        dst.temperature_c = src.temperature_c;
        dst.sample_valid = src.sample_valid;
        dst.power = src.power;
    }

    /// Remember a channel-3 manual power (clamped to 0–100) and apply it.
    /// The caller is responsible for switching the shadow mode to Manual.
    pub fn set_manual_power(&mut self, pct: i32) -> u8 {
        self.manual_power = pct.clamp(0, 100) as u8;
        self.resolve_shadow(ShadowMode::Manual);
        self.manual_power
    }

    // ── Overrides ─────────────────────────────────────────────

    /// Remote full-power override of channel 1 or 2.  Ignored for channel 3
    /// or when the channel has no probe.  Returns whether it took effect.
    pub fn force_override(&mut self, id: ChannelId) -> bool {
        if id == ChannelId::Ch3 || !self.channels[id.index()].probe_present {
            return false;
        }
        self.engage(id);
        self.remote_override = true;
        info!("Channels: remote override on {:?}", id);
        true
    }

    /// Drop both overrides and hand control back to the policy and switches.
    pub fn release_overrides(&mut self) {
        self.channels[ChannelId::Ch1.index()].override_active = false;
        self.channels[ChannelId::Ch2.index()].override_active = false;
        if self.remote_override {
            info!("Channels: remote override released");
        }
        self.remote_override = false;
    }

    /// Apply the manual toggle switches.  Suspended while a remote override
    /// is in force.
    pub fn apply_switches(&mut self, switches: SwitchState) {
        if self.remote_override {
            return;
        }
        for (id, on) in [
            (ChannelId::Ch1, switches.ch1()),
            (ChannelId::Ch2, switches.ch2()),
        ] {
            if on {
                if self.channels[id.index()].probe_present {
                    self.engage(id);
                }
            } else {
                self.channels[id.index()].override_active = false;
            }
        }
    }

    fn engage(&mut self, id: ChannelId) {
        let ch = &mut self.channels[id.index()];
        ch.override_active = true;
        ch.power = OVERRIDE_POWER;
    }
}
