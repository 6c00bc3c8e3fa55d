//! Integration tests for configuration persistence across reboots.
//!
//! Uses the real wear-levelled [`ConfigStore`] over the host-side
//! [`NvsEeprom`] region, with the controller driving saves.

use crate::mock_hw::{MockHardware, RecordingDisplay, RecordingSink};

use dewctrl::adapters::eeprom::{ERASED, NvsEeprom, REGION_SIZE};
use dewctrl::app::ports::EepromPort;
use dewctrl::app::service::DewController;
use dewctrl::config::record::{RECORD_SIZE, VALID_MARKER, marker};
use dewctrl::config::{BootRecord, ConfigStore, DewConfig, HardwareProfile, TrackingMode};
use dewctrl::protocol::Command;

fn boot(eeprom: NvsEeprom) -> (DewController, ConfigStore<NvsEeprom>, BootRecord) {
    let (store, config, record) = ConfigStore::open(eeprom).unwrap();
    let mut ctl = DewController::new(config, HardwareProfile::default());
    ctl.start(&mut MockHardware::new(), &mut RecordingDisplay::new());
    (ctl, store, record)
}

fn run(ctl: &mut DewController, store: &mut ConfigStore<NvsEeprom>, frame: &[u8]) {
    let cmd = Command::parse(frame).unwrap();
    ctl.handle_command(
        cmd,
        &mut MockHardware::new(),
        store,
        &mut RecordingSink::new(),
        &mut RecordingDisplay::new(),
    );
}

fn valid_slots(region: &[u8]) -> Vec<usize> {
    (0..REGION_SIZE / RECORD_SIZE)
        .filter(|s| marker(&region[s * RECORD_SIZE..]) == VALID_MARKER)
        .collect()
}

#[test]
fn first_boot_writes_defaults_at_slot_zero() {
    let (ctl, store, record) = boot(NvsEeprom::open().unwrap());
    assert_eq!(record, BootRecord::Defaulted);
    assert_eq!(*ctl.config(), DewConfig::default());
    assert_eq!(valid_slots(store.eeprom().region()), vec![0]);
}

#[test]
fn settings_survive_reboot_and_slot_rotates() {
    let (mut ctl, mut store, _) = boot(NvsEeprom::open().unwrap());
    run(&mut ctl, &mut store, b"a1#");
    run(&mut ctl, &mut store, b"e2#");
    run(&mut ctl, &mut store, b"]-0.75#");
    // Mutations land in place on the active slot.
    assert_eq!(valid_slots(store.eeprom().region()), vec![0]);

    let (ctl, store, record) = boot(store.into_inner());
    assert_eq!(
        record,
        BootRecord::Restored {
            from_addr: 0,
            to_addr: RECORD_SIZE
        }
    );
    assert_eq!(ctl.config().tracking_mode(), TrackingMode::Ambient);
    assert_eq!(ctl.config().ambient_bias(), 2);
    assert_eq!(ctl.config().channel_offsets(), [0.0, -0.75, 0.0]);
    assert_eq!(valid_slots(store.eeprom().region()), vec![1]);
}

#[test]
fn rotation_wraps_to_first_slot() {
    let slots = REGION_SIZE / RECORD_SIZE;
    let mut eeprom = NvsEeprom::open().unwrap();
    for _ in 0..slots {
        let (_, store, _) = boot(eeprom);
        eeprom = store.into_inner();
    }
    // Boot n writes slot n-1; after `slots` boots the last slot is active.
    assert_eq!(valid_slots(eeprom.region()), vec![slots - 1]);

    let (_, store, record) = boot(eeprom);
    assert_eq!(
        record,
        BootRecord::Restored {
            from_addr: (slots - 1) * RECORD_SIZE,
            to_addr: 0
        }
    );
    assert_eq!(store.active_slot(), 0);
}

#[test]
fn corrupted_body_falls_back_to_defaults() {
    let mut eeprom = NvsEeprom::open().unwrap();
    let mut garbage = [ERASED; RECORD_SIZE];
    garbage[..2].copy_from_slice(&VALID_MARKER.to_le_bytes());
    eeprom.write(3 * RECORD_SIZE, &garbage).unwrap();

    let (ctl, store, record) = boot(eeprom);
    assert_eq!(
        record,
        BootRecord::Unreadable {
            from_addr: 3 * RECORD_SIZE,
            to_addr: 4 * RECORD_SIZE
        }
    );
    assert_eq!(*ctl.config(), DewConfig::default());
    assert_eq!(valid_slots(store.eeprom().region()), vec![4]);
}

#[test]
fn fan_latch_is_written_through_to_storage() {
    let (mut ctl, mut store, _) = boot(NvsEeprom::open().unwrap());
    run(&mut ctl, &mut store, b"I40#");

    let mut hw = MockHardware::new();
    hw.board = Some(50.0);
    ctl.acquire(&mut hw, &mut store);
    assert!(ctl.fan_latched());

    let (ctl, _, _) = boot(store.into_inner());
    assert_eq!(ctl.config().fan_speed().percent(), 100);
    assert_eq!(ctl.config().fan_on_c(), 40);
}
