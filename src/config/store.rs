//! Wear-leveled configuration store.
//!
//! The EEPROM region is split into `N = len / RECORD_SIZE` slots.  Exactly
//! one slot carries the valid marker.  Rotation happens once per boot:
//!
//! ```text
//!  boot:  scan slots 0..N for marker 99 ──▶ found at k?
//!           yes: load k, write marker 0 at k, active = (k + RECORD_SIZE) mod region
//!                (active = k if marker 0 cannot be written)
//!           no:  defaults, active = 0
//!         write the (sanitised) config at active
//!  save:  rewrite the full record at active, in place
//! ```
//!
//! Long runs of mutations therefore land on a single slot; wear is spread
//! across power cycles, not across writes.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, EepromPort};
use crate::config::DewConfig;
use crate::config::record::{self, INVALID_MARKER, MARKER_LEN, RECORD_SIZE, VALID_MARKER};

/// How the active configuration was obtained at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootRecord {
    /// A valid record was found and moved to the next slot (`to_addr`
    /// equals `from_addr` when the old slot could not be invalidated).
    Restored { from_addr: usize, to_addr: usize },
    /// A slot carried the valid marker but its body did not decode;
    /// defaults were written to the next slot.
    Unreadable { from_addr: usize, to_addr: usize },
    /// No valid record anywhere; defaults were written at slot 0.
    Defaulted,
}

pub struct ConfigStore<E: EepromPort> {
    eeprom: E,
    region_len: usize,
    active_addr: usize,
}

impl<E: EepromPort> ConfigStore<E> {
    /// Locate the active record, rotate it, and return the configuration
    /// the controller should run with.
    ///
    /// Only a region too small to hold one record is an error; read and
    /// write failures are logged and the store falls back to defaults.
    pub fn open(mut eeprom: E) -> Result<(Self, DewConfig, BootRecord), ConfigError> {
        let slots = eeprom.capacity() / RECORD_SIZE;
        if slots == 0 {
            return Err(ConfigError::NoSlots);
        }
        let region_len = slots * RECORD_SIZE;

        let found = (0..slots)
            .map(|slot| slot * RECORD_SIZE)
            .find(|&addr| read_marker(&eeprom, addr) == VALID_MARKER);

        let (mut config, boot) = match found {
            Some(from_addr) => {
                let loaded = load_record(&eeprom, from_addr);
                // Rotate only once the old slot is invalidated, otherwise
                // two records would carry the valid marker.
                let to_addr = match eeprom.write(from_addr, &INVALID_MARKER.to_le_bytes()) {
                    Ok(()) => (from_addr + RECORD_SIZE) % region_len,
                    Err(e) => {
                        warn!(
                            "ConfigStore: failed to invalidate slot @{} ({}), staying on it",
                            from_addr, e
                        );
                        from_addr
                    }
                };
                match loaded {
                    Ok(cfg) => (cfg, BootRecord::Restored { from_addr, to_addr }),
                    Err(e) => {
                        warn!("ConfigStore: record @{} unreadable ({}), using defaults", from_addr, e);
                        (DewConfig::default(), BootRecord::Unreadable { from_addr, to_addr })
                    }
                }
            }
            None => (DewConfig::default(), BootRecord::Defaulted),
        };

        let active_addr = match boot {
            BootRecord::Restored { to_addr, .. } | BootRecord::Unreadable { to_addr, .. } => to_addr,
            BootRecord::Defaulted => 0,
        };

        if config.sanitize() {
            info!("ConfigStore: stored values out of range, clamped");
        }

        let mut store = Self {
            eeprom,
            region_len,
            active_addr,
        };
        if let Err(e) = store.save(&config) {
            warn!("ConfigStore: boot write @{} failed: {}", active_addr, e);
        }
        info!(
            "ConfigStore: {:?}, active slot {}/{}",
            boot,
            store.active_slot(),
            slots
        );
        Ok((store, config, boot))
    }

    pub fn active_addr(&self) -> usize {
        self.active_addr
    }

    pub fn active_slot(&self) -> usize {
        self.active_addr / RECORD_SIZE
    }

    pub fn slot_count(&self) -> usize {
        self.region_len / RECORD_SIZE
    }

    pub fn eeprom(&self) -> &E {
        &self.eeprom
    }

    pub fn into_inner(self) -> E {
        self.eeprom
    }
}

impl<E: EepromPort> ConfigPort for ConfigStore<E> {
    fn save(&mut self, config: &DewConfig) -> Result<(), ConfigError> {
        let rec = record::encode(config)?;
        self.eeprom
            .write(self.active_addr, &rec)
            .map_err(ConfigError::Storage)
    }
}

fn read_marker<E: EepromPort>(eeprom: &E, addr: usize) -> u16 {
    let mut buf = [0u8; MARKER_LEN];
    match eeprom.read(addr, &mut buf) {
        Ok(()) => record::marker(&buf),
        Err(e) => {
            warn!("ConfigStore: marker read @{} failed: {}", addr, e);
            INVALID_MARKER
        }
    }
}

fn load_record<E: EepromPort>(eeprom: &E, addr: usize) -> Result<DewConfig, ConfigError> {
    let mut buf = [0u8; RECORD_SIZE];
    eeprom.read(addr, &mut buf).map_err(ConfigError::Storage)?;
    record::decode(&buf)
}
