//! Integration tests for the serial link → DewController → actuators
//! pipeline.
//!
//! Frames are injected into host-side UART transports exactly as bytes
//! would arrive on the wire; replies are read back from both links.

use crate::mock_hw::{ActuatorCall, MockConfigStore, MockHardware, RecordingDisplay};

use dewctrl::adapters::uart::UartTransport;
use dewctrl::app::service::{DewController, FIRMWARE_VERSION};
use dewctrl::config::{DewConfig, HardwareProfile, ShadowMode, TrackingMode};
use dewctrl::control::channels::{ChannelId, SwitchState};
use dewctrl::control::policy::{PowerLevel, percent_to_duty};
use dewctrl::display::DisplayPage;
use dewctrl::protocol::{CommandQueue, SerialLink};
use dewctrl::scheduler::{ACQUISITION_INTERVAL_MS, AcquisitionPhase};

const TICK: u32 = ACQUISITION_INTERVAL_MS + 1;

struct Rig {
    ctl: DewController,
    hw: MockHardware,
    store: MockConfigStore,
    queue: CommandQueue,
    usb: SerialLink<UartTransport>,
    bt: SerialLink<UartTransport>,
    display: RecordingDisplay,
    now: u32,
}

impl Rig {
    fn new(hw: MockHardware) -> Self {
        Self::starting_at(hw, 0)
    }

    fn starting_at(mut hw: MockHardware, now: u32) -> Self {
        let mut ctl = DewController::new(DewConfig::default(), HardwareProfile::default());
        let mut display = RecordingDisplay::new();
        ctl.start(&mut hw, &mut display);
        Self {
            ctl,
            hw,
            store: MockConfigStore::new(),
            queue: CommandQueue::new(),
            usb: SerialLink::new("usb", UartTransport::new(0)),
            bt: SerialLink::new("bt", UartTransport::new(1)),
            display,
            now,
        }
    }

    /// One loop pass at the current time.
    fn pass(&mut self) {
        self.usb.poll(&mut self.queue);
        self.bt.poll(&mut self.queue);
        self.ctl.poll(
            self.now,
            &mut self.hw,
            &mut self.store,
            &mut self.queue,
            &mut (&mut self.usb, &mut self.bt),
            &mut self.display,
        );
    }

    fn step(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
        self.pass();
    }

    /// Run passes until one complete request/read cycle has finished.
    fn acquire(&mut self) {
        self.step(TICK);
        if self.ctl.acquisition_phase() == AcquisitionPhase::RequestSent {
            self.step(TICK);
        }
        assert_eq!(self.ctl.acquisition_phase(), AcquisitionPhase::Idle);
    }

    /// Send a frame on the USB link and process it.  Returns the reply.
    fn usb(&mut self, frame: &str) -> String {
        self.usb.transport_mut().inject(frame.as_bytes());
        self.pass();
        self.bt.transport_mut().take_output();
        String::from_utf8(self.usb.transport_mut().take_output()).unwrap()
    }

    fn powers(&mut self) -> String {
        self.usb("W#")
    }
}

fn outdoor() -> MockHardware {
    // 20 °C / 50 % gives a dew point of about 9.27 °C.
    MockHardware::new().with_ambient(20.0, 50.0)
}

// ── Power policy through the full loop ───────────────────────

#[test]
fn ambient_mode_cold_probe_gets_full_power() {
    let hw = MockHardware::new()
        .with_ambient(10.0, 60.0)
        .with_probe(ChannelId::Ch1, 0.0);
    let mut rig = Rig::new(hw);

    assert_eq!(rig.usb("a1#"), "");
    assert_eq!(rig.ctl.config().tracking_mode(), TrackingMode::Ambient);
    rig.acquire();

    assert_eq!(rig.powers(), "W100#0#0$");
    assert_eq!(rig.hw.heater_duty(ChannelId::Ch1), Some(percent_to_duty(100)));
    assert_eq!(rig.hw.heater_duty(ChannelId::Ch2), Some(0));
}

#[test]
fn dew_point_mode_steps_with_probe_temperature() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 20.0));
    rig.acquire();
    assert_eq!(rig.powers(), "W0#0#0$");

    rig.hw.probes[0] = Some(12.5);
    rig.acquire();
    assert_eq!(rig.powers(), "W50#0#0$");
    assert_eq!(rig.hw.heater_duty(ChannelId::Ch1), Some(percent_to_duty(50)));

    rig.hw.probes[0] = Some(9.0);
    rig.acquire();
    assert_eq!(rig.powers(), "W100#0#0$");
}

#[test]
fn switching_from_ambient_to_dew_point_tracking() {
    let hw = MockHardware::new()
        .with_ambient(10.0, 60.0)
        .with_probe(ChannelId::Ch1, 0.0);
    let mut rig = Rig::new(hw);
    rig.usb("a1#");
    rig.acquire();
    assert_eq!(rig.powers(), "W100#0#0$");

    // Saturated air at 5 °C puts the dew point at 5 °C.
    rig.hw = rig.hw.with_ambient(5.0, 100.0).with_probe(ChannelId::Ch1, 12.0);
    rig.usb("a2#");
    assert_eq!(rig.usb("T#"), "T2$");
    rig.acquire();
    assert!((rig.ctl.ambient().dew_point_c.unwrap() - 5.0).abs() < 0.01);
    assert_eq!(rig.powers(), "W0#0#0$");
    assert_eq!(rig.hw.heater_duty(ChannelId::Ch1), Some(0));
}

#[test]
fn global_offset_shifts_thresholds() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 12.5));
    rig.usb(">#");
    rig.usb(">#");
    assert_eq!(rig.usb("y#"), "y2$");
    rig.acquire();
    // Reference moves up by 2 °C: 12.5 is now only 1.2 °C above it.
    assert_eq!(rig.powers(), "W100#0#0$");
}

#[test]
fn halfway_mode_is_two_level() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 15.0));
    rig.usb("a3#");
    rig.acquire();
    assert_eq!(rig.powers(), "W0#0#0$");

    rig.hw.probes[0] = Some(14.0);
    rig.acquire();
    assert_eq!(rig.powers(), "W100#0#0$");
}

#[test]
fn missing_ambient_fails_safe() {
    let mut rig = Rig::new(MockHardware::new().with_probe(ChannelId::Ch1, -5.0));
    rig.acquire();
    assert_eq!(rig.powers(), "W0#0#0$");
    assert_eq!(rig.usb("A#"), "A0.0$");
    assert_eq!(rig.usb("R#"), "R0$");
    assert_eq!(rig.usb("D#"), "D0.0$");
}

#[test]
fn channel_offset_is_applied_to_reported_temperature() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 12.5));
    rig.usb("[1.5#");
    assert_eq!(rig.usb("?#"), "?1.50#0.00#0.00$");
    rig.acquire();
    assert_eq!(rig.usb("C#"), "C14.000#0.000#0.000$");
    // 14.0 is 4.73 °C above the dew point.
    assert_eq!(rig.powers(), "W20#0#0$");

    rig.usb("&#");
    assert_eq!(rig.usb("?#"), "?0.00#0.00#0.00$");
}

// ── Queries and broadcast ─────────────────────────────────────

#[test]
fn replies_broadcast_to_every_link() {
    let mut rig = Rig::new(MockHardware::new());
    rig.bt.transport_mut().inject(b"v#");
    rig.pass();

    let expected = format!("v{}$", FIRMWARE_VERSION);
    assert_eq!(rig.usb.transport_mut().take_output(), expected.as_bytes());
    assert_eq!(rig.bt.transport_mut().take_output(), expected.as_bytes());
}

#[test]
fn one_frame_per_pass_in_arrival_order() {
    let mut rig = Rig::new(MockHardware::new());
    rig.usb.transport_mut().inject(b"T#g#");
    rig.pass();
    assert_eq!(rig.usb.transport_mut().take_output(), b"T2$");
    rig.pass();
    assert_eq!(rig.usb.transport_mut().take_output(), b"g0$");
}

#[test]
fn burst_beyond_queue_capacity_is_held_in_the_link() {
    let mut rig = Rig::new(MockHardware::new());
    let mut burst = "T#".repeat(10);
    burst.push_str("S1#G30#");
    rig.usb.transport_mut().inject(burst.as_bytes());
    for _ in 0..14 {
        rig.pass();
    }
    let out = rig.usb.transport_mut().take_output();
    assert_eq!(out, "T2$".repeat(10).as_bytes());
    assert_eq!(rig.queue.dropped(), 0);
    assert_eq!(rig.ctl.config().shadow_mode(), ShadowMode::Manual);
    assert_eq!(rig.usb("W#"), "W0#0#30$");
}

#[test]
fn unknown_and_empty_frames_are_ignored() {
    let mut rig = Rig::new(MockHardware::new());
    assert_eq!(rig.usb("x#"), "");
    assert_eq!(rig.usb("#"), "");
    assert!(rig.store.saved.is_empty());
}

#[test]
fn queries_and_overrides_are_not_persisted() {
    let mut rig = Rig::new(MockHardware::new().with_probe(ChannelId::Ch1, 5.0));
    for q in ["v#", "T#", "F#", "W#", "K#", "1#", "n#", "{#", "}#"] {
        rig.usb(q);
    }
    assert!(rig.store.saved.is_empty());

    rig.usb("w#");
    assert_eq!(rig.store.saved.len(), 1);
}

#[test]
fn setters_clamp_and_persist() {
    let mut rig = Rig::new(MockHardware::new());
    rig.usb("e9#");
    assert_eq!(rig.usb("B#"), "B3$");
    rig.usb("b9000#");
    assert_eq!(rig.usb("H#"), "H5000$");
    rig.usb("f#");
    assert_eq!(rig.usb("h#"), "h2$");
    assert_eq!(rig.store.saved.len(), 3);
    assert_eq!(rig.store.last(), Some(rig.ctl.config()));
}

// ── Fan ───────────────────────────────────────────────────────

#[test]
fn fan_speed_snaps_to_supported_level() {
    let mut rig = Rig::new(MockHardware::new());
    rig.usb("s50#");
    assert_eq!(rig.usb("F#"), "F50$");
    assert_eq!(rig.hw.fan(), Some(PowerLevel::P50));

    rig.usb("s60#");
    assert_eq!(rig.usb("F#"), "F50$");
    rig.usb("s150#");
    assert_eq!(rig.usb("F#"), "F100$");
}

#[test]
fn board_temperature_latches_fan() {
    let mut rig = Rig::new(MockHardware::new());
    rig.usb("I40#");
    rig.usb("M35#");
    assert_eq!(rig.usb("L#"), "L35$");
    let saves = rig.store.saved.len();

    rig.hw.board = Some(45.0);
    rig.acquire();
    assert!(rig.ctl.fan_latched());
    assert_eq!(rig.hw.fan(), Some(PowerLevel::Full));
    assert_eq!(rig.usb("F#"), "F100$");
    assert_eq!(rig.usb("K#"), "K45$");
    assert_eq!(rig.store.saved.len(), saves + 1);

    // Between the thresholds nothing changes and nothing is written.
    rig.hw.board = Some(38.0);
    rig.acquire();
    rig.hw.board = None;
    rig.acquire();
    assert!(rig.ctl.fan_latched());
    assert_eq!(rig.store.saved.len(), saves + 1);

    rig.hw.board = Some(30.0);
    rig.acquire();
    assert!(!rig.ctl.fan_latched());
    assert_eq!(rig.hw.fan(), Some(PowerLevel::Off));
    assert_eq!(rig.usb("F#"), "F0$");
    assert_eq!(rig.store.saved.len(), saves + 2);
}

#[test]
fn latched_fan_keeps_full_speed_between_thresholds() {
    let mut rig = Rig::new(MockHardware::new());
    rig.usb("I40#");
    rig.usb("M35#");
    rig.hw.board = Some(45.0);
    rig.acquire();
    rig.hw.board = Some(38.0);
    rig.acquire();

    rig.usb("s20#");
    assert_eq!(rig.hw.fan(), Some(PowerLevel::Full));
    assert_eq!(rig.ctl.config().fan_speed(), PowerLevel::Full);
    rig.acquire();
    assert!(rig.ctl.fan_latched());
    assert_eq!(rig.hw.fan(), Some(PowerLevel::Full));
    assert_eq!(rig.usb("F#"), "F100$");

    // Once released the request is honoured again.
    rig.hw.board = Some(30.0);
    rig.acquire();
    rig.usb("s20#");
    assert_eq!(rig.hw.fan(), Some(PowerLevel::P20));
}

#[test]
fn overlapping_fan_off_threshold_is_pushed_below_on() {
    let mut rig = Rig::new(MockHardware::new());
    rig.usb("I40#");
    rig.usb("M45#");
    assert_eq!(rig.usb("L#"), "L38$");
}

#[test]
fn factory_reset_restores_defaults() {
    let mut rig = Rig::new(MockHardware::new());
    rig.usb("s75#");
    rig.usb("a1#");
    rig.usb("r#");
    assert_eq!(*rig.ctl.config(), DewConfig::default());
    assert_eq!(rig.hw.fan(), Some(PowerLevel::Off));
    assert_eq!(rig.store.last(), Some(&DewConfig::default()));
}

// ── Overrides and switches ────────────────────────────────────

#[test]
fn remote_override_forces_full_power_and_suspends_switches() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 25.0));
    rig.acquire();
    assert_eq!(rig.powers(), "W0#0#0$");

    rig.usb("1#");
    rig.acquire();
    assert_eq!(rig.powers(), "W100#0#0$");

    let reads = rig.hw.switch_reads;
    rig.acquire();
    assert_eq!(rig.hw.switch_reads, reads, "switches must not be polled");

    rig.usb("n#");
    rig.acquire();
    assert_eq!(rig.powers(), "W0#0#0$");
    assert!(rig.hw.switch_reads > reads);
}

#[test]
fn override_without_probe_is_ignored() {
    let mut rig = Rig::new(outdoor());
    rig.usb("2#");
    rig.acquire();
    assert_eq!(rig.powers(), "W0#0#0$");
    assert!(!rig.ctl.channels().remote_override());
}

#[test]
fn switch_overrides_follow_ladder() {
    let hw = outdoor()
        .with_probe(ChannelId::Ch1, 25.0)
        .with_probe(ChannelId::Ch2, 25.0);
    let mut rig = Rig::new(hw);

    rig.hw.switches = SwitchState::Both;
    rig.acquire();
    assert_eq!(rig.powers(), "W100#100#0$");

    rig.hw.switches = SwitchState::Sw2;
    rig.acquire();
    assert_eq!(rig.powers(), "W0#100#0$");

    rig.hw.switches = SwitchState::None;
    rig.acquire();
    assert_eq!(rig.powers(), "W0#0#0$");
}

// ── Shadow channel ────────────────────────────────────────────

#[test]
fn shadow_mirrors_channel_one_immediately() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 12.5));
    rig.acquire();
    rig.usb("S1#");
    assert_eq!(rig.powers(), "W50#0#50$");
    assert_eq!(rig.usb("E#"), "E1$");
}

#[test]
fn manual_power_selects_manual_mode() {
    let mut rig = Rig::new(outdoor());
    rig.usb("G40#");
    assert_eq!(rig.usb("E#"), "E3$");
    assert_eq!(rig.powers(), "W0#0#40$");
    rig.acquire();
    assert_eq!(rig.hw.heater_duty(ChannelId::Ch3), Some(percent_to_duty(40)));

    rig.usb("S0#");
    assert_eq!(rig.powers(), "W0#0#0$");
    rig.usb("S3#");
    assert_eq!(rig.powers(), "W0#0#40$");
}

#[test]
fn own_probe_reads_channel_three_with_conversion_wait() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch3, 9.0));
    rig.usb("S4#");
    assert_eq!(rig.ctl.config().shadow_mode(), ShadowMode::OwnProbe);
    rig.acquire();

    assert_eq!(rig.hw.single_requests, vec![ChannelId::Ch3]);
    let wait = u64::from(HardwareProfile::default().conversion_delay_ms());
    assert!(rig.hw.delayed_ms() >= wait);
    assert_eq!(rig.powers(), "W0#0#100$");
}

#[test]
fn unknown_shadow_code_turns_channel_off() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 9.0));
    rig.usb("S1#");
    rig.acquire();
    rig.usb("S6#");
    assert_eq!(rig.usb("E#"), "E0$");
    assert_eq!(rig.powers(), "W100#0#0$");
}

// ── Scheduling ────────────────────────────────────────────────

#[test]
fn acquisition_is_two_phase() {
    let mut rig = Rig::new(outdoor().with_probe(ChannelId::Ch1, 9.0));
    rig.step(TICK);
    assert_eq!(rig.ctl.acquisition_phase(), AcquisitionPhase::RequestSent);
    assert_eq!(rig.hw.shared_requests, 1);
    assert!(rig.hw.probe_reads.is_empty());

    // Nothing more until the next interval elapses.
    rig.step(10);
    assert!(rig.hw.probe_reads.is_empty());

    rig.step(TICK);
    assert_eq!(rig.ctl.acquisition_phase(), AcquisitionPhase::Idle);
    assert_eq!(rig.hw.probe_reads, vec![ChannelId::Ch1]);
    assert_eq!(rig.hw.shared_requests, 1);
}

#[test]
fn acquisition_survives_clock_wrap() {
    let hw = outdoor().with_probe(ChannelId::Ch1, 9.0);
    let mut rig = Rig::starting_at(hw, u32::MAX - 1500);
    rig.acquire();
    rig.hw.probes[0] = Some(20.0);
    rig.acquire();
    assert!(rig.now < 10_000, "clock should have wrapped");
    assert_eq!(rig.powers(), "W0#0#0$");
}

#[test]
fn display_pages_rotate_and_stop_when_off() {
    let mut rig = Rig::new(outdoor());
    assert!(rig.display.enabled);
    rig.pass();
    rig.step(2501);
    rig.step(2501);
    assert_eq!(
        rig.display.pages,
        [DisplayPage::Environment, DisplayPage::Channels, DisplayPage::System]
    );

    rig.usb("{#");
    assert!(!rig.display.enabled);
    rig.step(6000);
    assert_eq!(rig.display.pages.len(), 3);

    // Re-enabling shows the next page straight away.
    rig.usb("}#");
    assert_eq!(rig.display.pages.len(), 4);
    assert_eq!(rig.display.pages.last(), Some(&DisplayPage::Environment));
}

#[test]
fn start_turns_everything_off_first() {
    let rig = Rig::new(MockHardware::new().with_probe(ChannelId::Ch2, 10.0));
    assert_eq!(rig.hw.calls.first(), Some(&ActuatorCall::AllOff));
    assert_eq!(rig.ctl.channels().probe_count(), 1);
}
