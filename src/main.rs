//! Dew heater controller firmware: main entry point.
//!
//! Hexagonal layout with a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   NvsEeprom       UartTransport   LogDisplay  │
//! │  (Sensor+Actuator) (EepromPort)    (USB / BT link) (Display)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             DewController (pure logic)                 │    │
//! │  │  Policy · Channels · Fan supervisor · Commands         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ConfigStore (wear-levelled) · LoopScheduler (wrap-tolerant)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use dewctrl::adapters::eeprom::NvsEeprom;
use dewctrl::adapters::hardware::HardwareAdapter;
use dewctrl::adapters::log_display::LogDisplay;
use dewctrl::adapters::time::uptime_ms;
use dewctrl::adapters::uart::UartTransport;
use dewctrl::app::service::{DewController, FIRMWARE_VERSION};
use dewctrl::config::{ConfigStore, HardwareProfile};
use dewctrl::drivers::hw_init;
use dewctrl::drivers::watchdog::{Watchdog, WATCHDOG_TIMEOUT_MS};
use dewctrl::error::Error;
use dewctrl::pins;
use dewctrl::protocol::{CommandQueue, SerialLink};

/// Idle time between loop passes.
const LOOP_IDLE_MS: u32 = 5;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  dewctrl v{:<27}║", FIRMWARE_VERSION);
    info!("╚══════════════════════════════════════╝");

    let profile = HardwareProfile::default();

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(profile.bluetooth) {
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let watchdog = Watchdog::subscribe(WATCHDOG_TIMEOUT_MS);

    // ── 3. Configuration (rotates the wear-levelled slot) ─────
    let eeprom = match NvsEeprom::open() {
        Ok(e) => e,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsEeprom::detached()
        }
    };
    let (mut store, config, boot) = ConfigStore::open(eeprom).map_err(Error::from)?;
    info!("Config: {:?}", boot);

    // ── 4. Adapters ───────────────────────────────────────────
    let mut hw = HardwareAdapter::new(&profile);
    let mut display = LogDisplay::new();
    let mut queue = CommandQueue::new();

    let mut usb = SerialLink::new("usb", UartTransport::new(pins::USB_UART_PORT));
    let mut bt = profile
        .bluetooth
        .then(|| SerialLink::new("bt", UartTransport::new(pins::BT_UART_PORT)));

    // ── 5. Controller ─────────────────────────────────────────
    let mut controller = DewController::new(config, profile);
    controller.start(&mut hw, &mut display);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        usb.poll(&mut queue);
        if let Some(link) = bt.as_mut() {
            link.poll(&mut queue);
        }

        controller.poll(
            uptime_ms(),
            &mut hw,
            &mut store,
            &mut queue,
            &mut (&mut usb, &mut bt),
            &mut display,
        );

        watchdog.feed();
        esp_idf_hal::delay::FreeRtos::delay_ms(LOOP_IDLE_MS);
    }
}
