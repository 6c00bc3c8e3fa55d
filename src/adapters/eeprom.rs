//! EEPROM-style byte region backed by NVS.
//!
//! Implements [`EepromPort`] for the [`ConfigStore`].  The whole region is
//! held in RAM; every write updates the cache and commits the region as a
//! single NVS blob, so a power cut leaves either the old or the new image.
//!
//! - **`target_os = "espidf"`**: blob `region` in namespace `dewctrl`.
//! - **`not(target_os = "espidf")`**: RAM only (dev/test).
//!
//! [`ConfigStore`]: crate::config::ConfigStore

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{EepromPort, StorageError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Size of the emulated EEPROM, a whole number of config slots.
pub const REGION_SIZE: usize = 1024;
/// Value of never-written bytes.
pub const ERASED: u8 = 0xFF;

#[cfg(target_os = "espidf")]
const NAMESPACE: &[u8] = b"dewctrl\0";
#[cfg(target_os = "espidf")]
const BLOB_KEY: &[u8] = b"region\0";

pub struct NvsEeprom {
    cache: Vec<u8>,
    persistent: bool,
}

impl NvsEeprom {
    /// Initialise NVS flash and load the region.  A missing or
    /// wrong-sized blob yields an erased region.
    pub fn open() -> Result<Self, StorageError> {
        let mut cache = vec![ERASED; REGION_SIZE];

        #[cfg(target_os = "espidf")]
        {
            Self::init_flash()?;
            match Self::load_blob(&mut cache) {
                Ok(()) => info!("NvsEeprom: region loaded ({} bytes)", REGION_SIZE),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => info!("NvsEeprom: blank region"),
                Err(e) => {
                    warn!("NvsEeprom: region read failed ({}), starting erased", e);
                    cache.fill(ERASED);
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsEeprom: simulation backend ({} bytes)", REGION_SIZE);

        Ok(Self {
            cache,
            persistent: true,
        })
    }

    /// An erased region that is never committed.  Used when flash is
    /// unavailable so the controller can still run on defaults.
    pub fn detached() -> Self {
        Self {
            cache: vec![ERASED; REGION_SIZE],
            persistent: false,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Raw view of the region, for diagnostics and tests.
    pub fn region(&self) -> &[u8] {
        &self.cache
    }

    #[cfg(target_os = "espidf")]
    fn init_flash() -> Result<(), StorageError> {
        // SAFETY: called from the single main-task context before any
        // other NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NvsEeprom: erasing and re-initialising flash partition");
            let ret = unsafe { nvs_flash_erase() };
            if ret != ESP_OK {
                return Err(StorageError::Io(ret));
            }
            let ret = unsafe { nvs_flash_init() };
            if ret != ESP_OK {
                return Err(StorageError::Io(ret));
            }
        } else if ret != ESP_OK {
            return Err(StorageError::Io(ret));
        }
        Ok(())
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let ret = unsafe { nvs_open(NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn load_blob(cache: &mut [u8]) -> Result<(), i32> {
        Self::with_nvs_handle(false, |handle| {
            let mut size = cache.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    BLOB_KEY.as_ptr() as *const _,
                    cache.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size != cache.len() {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }
            Ok(())
        })
    }

    #[cfg(target_os = "espidf")]
    fn commit(&self) -> Result<(), StorageError> {
        if !self.persistent {
            return Ok(());
        }
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    BLOB_KEY.as_ptr() as *const _,
                    self.cache.as_ptr() as *const _,
                    self.cache.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(StorageError::Io)
    }

    #[cfg(not(target_os = "espidf"))]
    fn commit(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

fn span(addr: usize, len: usize) -> Result<core::ops::Range<usize>, StorageError> {
    match addr.checked_add(len) {
        Some(end) if end <= REGION_SIZE => Ok(addr..end),
        _ => Err(StorageError::OutOfBounds),
    }
}

impl EepromPort for NvsEeprom {
    fn capacity(&self) -> usize {
        REGION_SIZE
    }

    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        buf.copy_from_slice(&self.cache[span(addr, buf.len())?]);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        let range = span(addr, data.len())?;
        if self.cache[range.clone()] == *data {
            return Ok(());
        }
        let previous: Vec<u8> = self.cache[range.clone()].to_vec();
        self.cache[range.clone()].copy_from_slice(data);
        self.commit().inspect_err(|_| {
            self.cache[range].copy_from_slice(&previous);
        })
    }
}
