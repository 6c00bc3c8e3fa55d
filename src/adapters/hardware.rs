//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the three heater drivers, the fan and the
//! switch ladder, exposing them through [`SensorPort`], [`ActuatorPort`]
//! and `embedded_hal::delay::DelayNs`.  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ActuatorPort, AmbientReading, SensorPort};
use crate::config::HardwareProfile;
use crate::control::channels::{ChannelId, SwitchState};
use crate::control::policy::PowerLevel;
use crate::drivers::fan::FanDriver;
use crate::drivers::heater::{HeaterDriver, LedcChannel};
use crate::drivers::hw_init;
use crate::drivers::status_led::StatusLed;
use crate::drivers::switches::SwitchLadder;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensors: SensorHub,
    heaters: [HeaterDriver<LedcChannel>; 3],
    fan: FanDriver<LedcChannel>,
    switches: SwitchLadder,
}

impl HardwareAdapter {
    pub fn new(profile: &HardwareProfile) -> Self {
        Self {
            sensors: SensorHub::new(profile),
            heaters: [
                HeaterDriver::new(LedcChannel::new(hw_init::LEDC_CH_HEATER_1)),
                HeaterDriver::new(LedcChannel::new(hw_init::LEDC_CH_HEATER_2)),
                HeaterDriver::new(LedcChannel::new(hw_init::LEDC_CH_HEATER_3)),
            ],
            fan: FanDriver::new(LedcChannel::new(hw_init::LEDC_CH_FAN), StatusLed::new()),
            switches: SwitchLadder::new(),
        }
    }

    pub fn heater_duty(&self, channel: ChannelId) -> u8 {
        self.heaters[channel.index()].duty()
    }

    pub fn fan_speed(&self) -> PowerLevel {
        self.fan.speed()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn probe_present(&mut self, channel: ChannelId) -> bool {
        self.sensors.detect(channel)
    }

    fn request_conversions(&mut self) {
        self.sensors.request_shared();
    }

    fn request_probe_conversion(&mut self, channel: ChannelId) {
        self.sensors.request(channel);
    }

    fn read_probe(&mut self, channel: ChannelId) -> Option<f32> {
        self.sensors.read(channel)
    }

    fn read_board_temp(&mut self) -> Option<f32> {
        self.sensors.read_board()
    }

    fn read_ambient(&mut self) -> AmbientReading {
        self.sensors.read_ambient()
    }

    fn read_switches(&mut self) -> SwitchState {
        self.switches.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_heater_duty(&mut self, channel: ChannelId, duty: u8) {
        self.heaters[channel.index()].set_duty(duty);
    }

    fn set_fan(&mut self, level: PowerLevel) {
        self.fan.set_speed(level);
    }

    fn all_off(&mut self) {
        for heater in &mut self.heaters {
            heater.off();
        }
        self.fan.set_speed(PowerLevel::Off);
    }
}

// ── Delay ─────────────────────────────────────────────────────

impl DelayNs for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    /// Millisecond waits yield to the scheduler instead of spinning.
    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }
}
