//! End-to-end run of the firmware wiring on the host simulation backends.
//!
//! Same adapters as `main.rs`: sensor values are injected through the
//! driver-level sim hooks, commands arrive over the host UART transport.
//! This is the only test in this binary that touches the sim statics.

use dewctrl::adapters::eeprom::NvsEeprom;
use dewctrl::adapters::hardware::HardwareAdapter;
use dewctrl::adapters::log_display::LogDisplay;
use dewctrl::adapters::uart::UartTransport;
use dewctrl::app::service::DewController;
use dewctrl::config::{ConfigStore, HardwareProfile};
use dewctrl::control::channels::ChannelId;
use dewctrl::control::policy::{PowerLevel, percent_to_duty};
use dewctrl::drivers::switches::sim_set_ladder;
use dewctrl::protocol::{CommandQueue, NullTransport, SerialLink};
use dewctrl::sensors::ambient::sim_set_ambient;
use dewctrl::sensors::probe::{BOARD_SLOT, sim_set_probe};

#[test]
fn simulated_firmware_loop() {
    sim_set_probe(ChannelId::Ch1.index(), Some(9.0));
    sim_set_probe(ChannelId::Ch2.index(), Some(25.0));
    sim_set_probe(BOARD_SLOT, Some(30.0));
    sim_set_ambient(Some(20.0), Some(50.0));
    sim_set_ladder(0);

    let profile = HardwareProfile::default();
    let (mut store, config, _) = ConfigStore::open(NvsEeprom::open().unwrap()).unwrap();
    let mut hw = HardwareAdapter::new(&profile);
    let mut display = LogDisplay::new();
    let mut queue = CommandQueue::new();
    let mut usb = SerialLink::new("usb", UartTransport::new(0));
    let mut bt: Option<SerialLink<NullTransport>> = None;

    let mut ctl = DewController::new(config, profile);
    ctl.start(&mut hw, &mut display);
    assert_eq!(ctl.channels().probe_count(), 2);

    usb.transport_mut().inject(b"s75#W#");
    let mut now = 0u32;
    for _ in 0..6 {
        usb.poll(&mut queue);
        ctl.poll(now, &mut hw, &mut store, &mut queue, &mut (&mut usb, &mut bt), &mut display);
        now = now.wrapping_add(1001);
    }

    assert_eq!(hw.fan_speed(), PowerLevel::P75);
    assert_eq!(hw.heater_duty(ChannelId::Ch1), percent_to_duty(100));
    assert_eq!(hw.heater_duty(ChannelId::Ch2), 0);
    assert_eq!(ctl.board_temp_c(), Some(30.0));
    assert!(display.pages_shown() > 0);

    // The W# reply was produced before any acquisition completed.
    assert_eq!(usb.transport_mut().take_output(), b"W0#0#0$");

    // Both switches on (10-bit ladder reading inside the Both band).
    sim_set_ladder(500);
    for _ in 0..3 {
        ctl.poll(now, &mut hw, &mut store, &mut queue, &mut (&mut usb, &mut bt), &mut display);
        now = now.wrapping_add(1001);
    }
    assert_eq!(hw.heater_duty(ChannelId::Ch2), percent_to_duty(100));
}
