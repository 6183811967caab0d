//! NVS-backed configuration record.
//!
//! One postcard blob under the `storage` namespace, key `plant`. On the
//! host the flash is replaced by an in-memory record so the store logic
//! can be exercised in unit tests.

use crate::app::ports::{ConfigPort, StorageError};
use crate::config::IrrigationConfig;
#[cfg(target_os = "espidf")]
use crate::error::Error;
use crate::error::Result;

#[cfg(target_os = "espidf")]
use core::ffi::CStr;
#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    self, nvs_close, nvs_commit, nvs_flash_erase, nvs_flash_init, nvs_get_blob, nvs_handle_t,
    nvs_open, nvs_set_blob, ESP_ERR_NVS_NEW_VERSION_FOUND, ESP_ERR_NVS_NO_FREE_PAGES,
    ESP_ERR_NVS_NOT_FOUND, ESP_OK,
};
use log::{debug, warn};

#[cfg(target_os = "espidf")]
const STORAGE_NAMESPACE: &CStr = c"storage";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &CStr = c"plant";

/// Persistent home of the irrigation config.
pub struct NvsConfigStore {
    #[cfg(not(target_os = "espidf"))]
    record: RefCell<Option<Vec<u8>>>,
}

impl NvsConfigStore {
    /// Opens the store, initializing the NVS partition on hardware.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self> {
        init_flash()?;
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self> {
        Ok(Self {
            record: RefCell::new(None),
        })
    }
}

impl Default for NvsConfigStore {
    /// Degraded store that skips partition init. Loads report
    /// [`StorageError::NotFound`] and saves fail until the next reboot
    /// heals the partition.
    fn default() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            record: RefCell::new(None),
        }
    }
}

// ─── espidf backend ───

/// Initializes the NVS partition, erasing and retrying once when the
/// partition is full or was written by a newer IDF layout.
#[cfg(target_os = "espidf")]
fn init_flash() -> Result<()> {
    // SAFETY: plain IDF calls with no outstanding NVS handles.
    let mut rc = unsafe { nvs_flash_init() };
    if rc == ESP_ERR_NVS_NO_FREE_PAGES || rc == ESP_ERR_NVS_NEW_VERSION_FOUND {
        warn!("nvs partition unusable (rc={rc}), erasing");
        unsafe {
            rc = nvs_flash_erase();
            if rc == ESP_OK {
                rc = nvs_flash_init();
            }
        }
    }
    if rc == ESP_OK {
        Ok(())
    } else {
        warn!("nvs_flash_init failed (rc={rc})");
        Err(Error::Init("nvs flash init failed"))
    }
}

/// Runs `f` against an open handle on the `storage` namespace, closing
/// the handle on every path.
#[cfg(target_os = "espidf")]
fn with_nvs_handle<T>(
    write: bool,
    on_open_fail: StorageError,
    f: impl FnOnce(nvs_handle_t) -> core::result::Result<T, StorageError>,
) -> core::result::Result<T, StorageError> {
    let mode = if write {
        sys::nvs_open_mode_t_NVS_READWRITE
    } else {
        sys::nvs_open_mode_t_NVS_READONLY
    };
    let mut handle: nvs_handle_t = 0;
    // SAFETY: namespace is a NUL-terminated literal, handle outlives the call.
    let rc = unsafe { nvs_open(STORAGE_NAMESPACE.as_ptr(), mode, &mut handle) };
    if rc != ESP_OK {
        // A namespace nothing has written yet opens as not-found in
        // read-only mode; that is the normal first boot.
        if rc != ESP_ERR_NVS_NOT_FOUND {
            warn!("nvs_open failed (rc={rc})");
        }
        return Err(on_open_fail);
    }
    let out = f(handle);
    // SAFETY: handle came from a successful nvs_open.
    unsafe { nvs_close(handle) };
    out
}

#[cfg(target_os = "espidf")]
fn load_blob() -> core::result::Result<Vec<u8>, StorageError> {
    with_nvs_handle(false, StorageError::NotFound, |handle| {
        let mut size: usize = 0;
        // SAFETY: NULL out_value asks NVS for the blob length only.
        let rc =
            unsafe { nvs_get_blob(handle, CONFIG_KEY.as_ptr(), core::ptr::null_mut(), &mut size) };
        if rc == ESP_ERR_NVS_NOT_FOUND {
            return Err(StorageError::NotFound);
        }
        if rc != ESP_OK {
            warn!("nvs_get_blob size query failed (rc={rc})");
            return Err(StorageError::Corrupted);
        }
        let mut buf = vec![0u8; size];
        // SAFETY: buf holds exactly the queried size.
        let rc = unsafe {
            nvs_get_blob(
                handle,
                CONFIG_KEY.as_ptr(),
                buf.as_mut_ptr().cast(),
                &mut size,
            )
        };
        if rc != ESP_OK {
            warn!("nvs_get_blob read failed (rc={rc})");
            return Err(StorageError::Corrupted);
        }
        buf.truncate(size);
        Ok(buf)
    })
}

#[cfg(target_os = "espidf")]
fn save_blob(bytes: &[u8]) -> core::result::Result<(), StorageError> {
    with_nvs_handle(true, StorageError::WriteFailed, |handle| {
        // SAFETY: bytes is a live slice for the duration of the call.
        let rc = unsafe {
            nvs_set_blob(
                handle,
                CONFIG_KEY.as_ptr(),
                bytes.as_ptr().cast(),
                bytes.len(),
            )
        };
        if rc != ESP_OK {
            warn!("nvs_set_blob failed (rc={rc})");
            return Err(StorageError::WriteFailed);
        }
        // SAFETY: handle is open for writing.
        let rc = unsafe { nvs_commit(handle) };
        if rc != ESP_OK {
            warn!("nvs_commit failed (rc={rc})");
            return Err(StorageError::CommitFailed);
        }
        Ok(())
    })
}

// ─── host backend ───

#[cfg(not(target_os = "espidf"))]
impl NvsConfigStore {
    fn load_blob(&self) -> core::result::Result<Vec<u8>, StorageError> {
        self.record.borrow().clone().ok_or(StorageError::NotFound)
    }

    fn save_blob(&self, bytes: &[u8]) -> core::result::Result<(), StorageError> {
        self.record.replace(Some(bytes.to_vec()));
        Ok(())
    }
}

// ─── ConfigPort implementation ───

impl ConfigPort for NvsConfigStore {
    fn load(&self) -> core::result::Result<IrrigationConfig, StorageError> {
        #[cfg(target_os = "espidf")]
        let bytes = load_blob()?;
        #[cfg(not(target_os = "espidf"))]
        let bytes = self.load_blob()?;

        let config = postcard::from_bytes::<IrrigationConfig>(&bytes).map_err(|e| {
            warn!("stored config does not decode: {e}");
            StorageError::Corrupted
        })?;
        debug!("loaded config blob ({} bytes)", bytes.len());
        Ok(config)
    }

    fn save(&self, config: &IrrigationConfig) -> core::result::Result<(), StorageError> {
        let bytes = postcard::to_allocvec(config).map_err(|e| {
            warn!("config does not encode: {e}");
            StorageError::SerializeFailed
        })?;

        #[cfg(target_os = "espidf")]
        save_blob(&bytes)?;
        #[cfg(not(target_os = "espidf"))]
        self.save_blob(&bytes)?;

        debug!("stored config blob ({} bytes)", bytes.len());
        Ok(())
    }
}
