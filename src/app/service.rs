//! Application service: the hexagonal core.
//!
//! [`DewController`] owns the configuration, channel bank, ambient sample,
//! fan supervisor and loop scheduler.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ ResponseSink
//!                 │        DewController         │
//! ActuatorPort ◀──│ Channels · Policy · Fan ·    │ ──▶ DisplaySink
//!                 │ Scheduler · Command handler  │
//!  CommandQueue ─▶└──────────────────────────────┘ ──▶ ConfigPort
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{DewConfig, HardwareProfile, ShadowMode};
use crate::control::channels::{ChannelBank, ChannelId};
use crate::control::dewpoint::AmbientSample;
use crate::display::{DisplaySnapshot, PageRotation};
use crate::protocol::command::Command;
use crate::protocol::queue::CommandQueue;
use crate::protocol::response::{Response, ResponseBuilder};
use crate::safety::FanSupervisor;
use crate::scheduler::{AcquisitionPhase, AcquisitionStep, LoopScheduler};

use super::ports::{ActuatorPort, ConfigPort, DisplaySink, ResponseSink, SensorPort};

pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ───────────────────────────────────────────────────────────────
// DewController
// ───────────────────────────────────────────────────────────────

pub struct DewController {
    config: DewConfig,
    profile: HardwareProfile,
    channels: ChannelBank,
    ambient: AmbientSample,
    board_temp_c: Option<f32>,
    fan: FanSupervisor,
    scheduler: LoopScheduler,
    pages: PageRotation,
    display_enabled: bool,
}

impl DewController {
    /// Construct the controller from the configuration loaded at boot.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: DewConfig, profile: HardwareProfile) -> Self {
        Self {
            config,
            profile,
            channels: ChannelBank::new(),
            ambient: AmbientSample::default(),
            board_temp_c: None,
            fan: FanSupervisor::new(),
            scheduler: LoopScheduler::new(),
            pages: PageRotation::new(),
            display_enabled: true,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Heaters off, probe detection, fan at the configured speed.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        display: &mut impl DisplaySink,
    ) {
        hw.all_off();
        for id in ChannelId::ALL {
            let present = hw.probe_present(id);
            self.channels.set_probe_present(id, present);
        }
        hw.set_fan(self.config.fan_speed());
        display.set_enabled(self.display_enabled);
        info!(
            "DewController started: {} probe(s), mode {:?}, shadow {:?}",
            self.channels.probe_count(),
            self.config.tracking_mode(),
            self.config.shadow_mode()
        );
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one cooperative loop pass: one command, then whichever of
    /// switch poll, acquisition and display refresh are due.
    pub fn poll<H>(
        &mut self,
        now_ms: u32,
        hw: &mut H,
        store: &mut impl ConfigPort,
        queue: &mut CommandQueue,
        out: &mut impl ResponseSink,
        display: &mut impl DisplaySink,
    ) where
        H: SensorPort + ActuatorPort + DelayNs,
    {
        if let Some(frame) = queue.pop() {
            match Command::parse(&frame) {
                Some(cmd) => self.handle_command(cmd, hw, store, out, display),
                None => debug!("DewController: ignored frame {:?}", frame.as_slice()),
            }
        }

        let due = self.scheduler.poll(
            now_ms,
            self.config.page_duration_ms(),
            !self.channels.remote_override(),
            self.display_enabled,
        );

        if due.switches {
            let switches = hw.read_switches();
            self.channels.apply_switches(switches);
        }

        match due.acquisition {
            Some(AcquisitionStep::Request) => hw.request_conversions(),
            Some(AcquisitionStep::Read) => {
                self.acquire(hw, store);
                self.scheduler.acquisition_complete();
            }
            None => {}
        }

        if due.display {
            self.refresh_display(display);
        }
    }

    /// Phase B of an acquisition: read every sensor, run the fan
    /// supervisor and the channel update, then drive the heaters.
    pub fn acquire<H>(&mut self, hw: &mut H, store: &mut impl ConfigPort)
    where
        H: SensorPort + ActuatorPort + DelayNs,
    {
        let mut raw = [None; 3];
        for id in [ChannelId::Ch1, ChannelId::Ch2] {
            if self.channels.channel(id).probe_present {
                raw[id.index()] = hw.read_probe(id);
            }
        }

        self.board_temp_c = hw.read_board_temp();
        if self.fan.evaluate(self.board_temp_c, &mut self.config).is_change() {
            hw.set_fan(self.config.fan_speed());
            self.persist(store);
        }

        if self.config.shadow_mode() == ShadowMode::OwnProbe
            && self.channels.channel(ChannelId::Ch3).probe_present
        {
            hw.request_probe_conversion(ChannelId::Ch3);
            hw.delay_ms(self.profile.conversion_delay_ms());
            raw[ChannelId::Ch3.index()] = hw.read_probe(ChannelId::Ch3);
        }

        self.ambient = AmbientSample::from_reading(hw.read_ambient(), self.config.ambient_bias());
        self.channels.update(raw, &self.config, &self.ambient);

        for (id, duty) in ChannelId::ALL.into_iter().zip(self.channels.duties()) {
            hw.set_heater_duty(id, duty);
        }

        debug!(
            "acquire: amb={:?} rh={:?} dp={:?} power={:?}",
            self.ambient.temperature_c,
            self.ambient.humidity_pct,
            self.ambient.dew_point_c,
            self.channels.channels().map(|c| c.power)
        );
    }

    fn refresh_display(&mut self, display: &mut impl DisplaySink) {
        let page = self.pages.advance();
        display.show(page, &self.snapshot());
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute one parsed command.  Queries reply through `out`; every
    /// configuration mutation is persisted immediately.
    pub fn handle_command(
        &mut self,
        cmd: Command,
        hw: &mut impl ActuatorPort,
        store: &mut impl ConfigPort,
        out: &mut impl ResponseSink,
        display: &mut impl DisplaySink,
    ) {
        if let Some(reply) = self.query(cmd) {
            out.send(&reply);
            return;
        }

        match cmd {
            Command::Override(id) => {
                if !self.channels.force_override(id) {
                    debug!("DewController: override of {:?} ignored, no probe", id);
                }
            }
            Command::ReleaseOverrides => self.channels.release_overrides(),
            Command::DisplayOff | Command::DisplayOn => {
                self.display_enabled = cmd == Command::DisplayOn;
                display.set_enabled(self.display_enabled);
            }
            _ => {
                self.mutate_config(cmd, hw);
                self.persist(store);
            }
        }
    }

    fn mutate_config(&mut self, cmd: Command, hw: &mut impl ActuatorPort) {
        let cfg = &mut self.config;
        match cmd {
            Command::SetTrackingMode(mode) => cfg.set_tracking_mode(mode),
            Command::SetDisplayUnit(unit) => cfg.set_display_unit(unit),
            Command::DecrementOffset => cfg.adjust_offset(-1),
            Command::IncrementOffset => cfg.adjust_offset(1),
            Command::ZeroOffset => cfg.set_offset(0),
            Command::SetFanSpeed(pct) => {
                if self.fan.is_latched() {
                    info!("DewController: fan latched by board temperature, s{} ignored", pct);
                } else {
                    cfg.set_fan_speed(pct);
                    hw.set_fan(cfg.fan_speed());
                }
            }
            Command::SetFanOnThreshold(c) => {
                cfg.set_fan_on_threshold(c);
                hw.set_fan(cfg.fan_speed());
            }
            Command::SetFanOffThreshold(c) => cfg.set_fan_off_threshold(c),
            Command::SetAmbientBias(b) => cfg.set_ambient_bias(b),
            Command::SetChannelOffset(id, o) => cfg.set_channel_offset(id, o),
            Command::ClearChannelOffsets => cfg.clear_channel_offsets(),
            Command::SetShadowMode(mode) => {
                cfg.set_shadow_mode(mode);
                self.channels.apply_shadow_mode(mode);
            }
            Command::SetManualPower(pct) => {
                cfg.set_shadow_mode(ShadowMode::Manual);
                self.channels.set_manual_power(pct);
            }
            Command::SetPageDuration(ms) => cfg.set_page_duration_ms(ms),
            Command::FactoryReset => {
                info!("DewController: factory defaults restored");
                *cfg = DewConfig::default();
                hw.set_fan(cfg.fan_speed());
            }
            // `w` only persists.
            _ => {}
        }
    }

    /// Reply for a query command, `None` for anything else.
    pub fn query(&self, cmd: Command) -> Option<Response> {
        let cfg = &self.config;
        let ch = self.channels.channels();
        let reply = match cmd {
            Command::GetVersion => ResponseBuilder::new('v').text(FIRMWARE_VERSION),
            Command::GetChannelOffsets => {
                let [a, b, c] = cfg.channel_offsets();
                ResponseBuilder::new('?').float(a, 2).float(b, 2).float(c, 2)
            }
            Command::GetShadowMode => ResponseBuilder::new('E').int(cfg.shadow_mode().code()),
            Command::GetProbeCount => ResponseBuilder::new('g').int(self.channels.probe_count()),
            Command::GetTrackingMode => ResponseBuilder::new('T').int(cfg.tracking_mode().code()),
            Command::GetFanSpeed => ResponseBuilder::new('F').int(self.reported_fan_speed()),
            Command::GetAmbient => with_fallback('A', self.ambient.temperature_c, 3, "0.0"),
            Command::GetHumidity => with_fallback('R', self.ambient.humidity_pct, 2, "0"),
            Command::GetDewPoint => with_fallback('D', self.ambient.dew_point_c, 3, "0.0"),
            Command::GetTemperatures => ResponseBuilder::new('C')
                .float(ch[0].temperature_c, 3)
                .float(ch[1].temperature_c, 3)
                .float(ch[2].temperature_c, 3),
            Command::GetPowers => ResponseBuilder::new('W')
                .int(ch[0].power)
                .int(ch[1].power)
                .int(ch[2].power),
            Command::GetAmbientBias => ResponseBuilder::new('B').int(cfg.ambient_bias()),
            Command::GetPageDuration => ResponseBuilder::new('H').int(cfg.page_duration_ms()),
            Command::GetDisplayUnit => ResponseBuilder::new('h').int(cfg.display_unit().code()),
            Command::GetOffset => ResponseBuilder::new('y').int(cfg.offset()),
            Command::GetFanOnThreshold => ResponseBuilder::new('J').int(cfg.fan_on_c()),
            Command::GetBoardTemp => {
                ResponseBuilder::new('K').int(self.board_temp_c.map_or(0, |t| t as i32))
            }
            Command::GetFanOffThreshold => ResponseBuilder::new('L').int(cfg.fan_off_c()),
            _ => return None,
        };
        Some(reply.finish())
    }

    /// Fan speed as reported to the host: under board-temperature control
    /// only on (100) or off (0).
    fn reported_fan_speed(&self) -> u8 {
        if self.config.fan_temperature_controlled() {
            if self.fan.is_latched() { 100 } else { 0 }
        } else {
            self.config.fan_speed().percent()
        }
    }

    fn persist(&mut self, store: &mut impl ConfigPort) {
        if let Err(e) = store.save(&self.config) {
            warn!("DewController: config write failed: {}", e);
        }
    }

    // ── Read-only access ──────────────────────────────────────

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            ambient: self.ambient,
            channels: *self.channels.channels(),
            channel_offsets: self.config.channel_offsets(),
            tracking_mode: self.config.tracking_mode(),
            offset: self.config.offset(),
            ambient_bias: self.config.ambient_bias(),
            shadow_mode: self.config.shadow_mode(),
            fan_speed: self.config.fan_speed(),
            board_temp_c: self.board_temp_c,
            unit: self.config.display_unit(),
        }
    }

    pub fn config(&self) -> &DewConfig {
        &self.config
    }

    pub fn channels(&self) -> &ChannelBank {
        &self.channels
    }

    pub fn ambient(&self) -> &AmbientSample {
        &self.ambient
    }

    pub fn board_temp_c(&self) -> Option<f32> {
        self.board_temp_c
    }

    pub fn display_enabled(&self) -> bool {
        self.display_enabled
    }

    pub fn fan_latched(&self) -> bool {
        self.fan.is_latched()
    }

    pub fn acquisition_phase(&self) -> AcquisitionPhase {
        self.scheduler.acquisition_phase()
    }
}

fn with_fallback(code: char, value: Option<f32>, decimals: usize, fallback: &str) -> ResponseBuilder {
    match value {
        Some(v) => ResponseBuilder::new(code).float(v, decimals),
        None => ResponseBuilder::new(code).text(fallback),
    }
}
