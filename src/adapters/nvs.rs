//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] on top of raw NVS blob reads and writes.
//!
//! - Settings are range-checked before persistence.
//! - Persisted settings are `postcard`-encoded blobs.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!   The simulation backend is an in-memory map.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::LockSettings;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const SETTINGS_NAMESPACE: &str = "lockkit";
const SETTINGS_KEY: &str = "locksettings";

/// NVS keys and namespaces are limited to 15 characters.
const NVS_NAME_MAX: usize = 15;
/// One hour; longer auto-lock delays are rejected.
const MAX_AUTO_LOCK_SECS: u32 = 3600;
const MAX_BLOB_SIZE: usize = 64;

/// Outcome of a failed blob access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlobError {
    NotFound,
    IoError,
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, heapless::Vec<u8, MAX_BLOB_SIZE>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// NUL-terminated, truncated copy of an NVS name.
    fn c_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
        let mut buf = [0u8; NVS_NAME_MAX + 1];
        let bytes = name.as_bytes();
        let len = bytes.len().min(NVS_NAME_MAX);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        let ns = Self::c_name(namespace);
        let k = Self::c_name(key);
        let trim = |b: &[u8]| String::from_utf8_lossy(b).trim_end_matches('\0').to_owned();
        format!("{}::{}", trim(&ns), trim(&k))
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: handle was opened above and is closed exactly once.
        unsafe {
            nvs_close(handle);
        }
        result
    }

    // ── Blob primitives ───────────────────────────────────────────

    fn get_blob(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, BlobError> {
        #[cfg(not(target_os = "espidf"))]
        {
            match self.store.borrow().get(&Self::composite_key(namespace, key)) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(BlobError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let k = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut size = buf.len();
                // SAFETY: `k` is NUL-terminated; `buf` is valid for `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(handle, k.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(BlobError::NotFound),
                Err(_) => Err(BlobError::IoError),
            }
        }
    }

    fn put_blob(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), BlobError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let blob = heapless::Vec::from_slice(data).map_err(|_| {
                warn!("NvsAdapter: {} byte blob exceeds {} bytes", data.len(), MAX_BLOB_SIZE);
                BlobError::IoError
            })?;
            self.store
                .borrow_mut()
                .insert(Self::composite_key(namespace, key), blob);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let k = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                // SAFETY: `k` is NUL-terminated; `data` is valid for its length.
                let ret = unsafe {
                    nvs_set_blob(handle, k.as_ptr() as *const _, data.as_ptr() as *const _, data.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                warn!("NvsAdapter: NVS write error {}", e);
                BlobError::IoError
            })
        }
    }
}

fn validate_settings(settings: &LockSettings) -> Result<(), ConfigError> {
    if settings.auto_lock_enabled && settings.auto_lock_duration_secs == 0 {
        return Err(ConfigError::ValidationFailed(
            "auto_lock_duration_secs must be > 0 when auto-lock is enabled",
        ));
    }
    if settings.auto_lock_duration_secs > MAX_AUTO_LOCK_SECS {
        return Err(ConfigError::ValidationFailed(
            "auto_lock_duration_secs must be <= 3600",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<LockSettings, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];

        match self.get_blob(SETTINGS_NAMESPACE, SETTINGS_KEY, &mut buf) {
            Ok(len) => {
                let settings: LockSettings =
                    postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded lock settings ({} bytes)", len);
                Ok(settings)
            }
            Err(BlobError::NotFound) => {
                info!("NvsAdapter: no stored lock settings, using defaults");
                Ok(LockSettings::default())
            }
            Err(BlobError::IoError) => {
                warn!("NvsAdapter: read error, using defaults");
                Ok(LockSettings::default())
            }
        }
    }

    fn save(&self, settings: &LockSettings) -> Result<(), ConfigError> {
        validate_settings(settings)?;
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let bytes = postcard::to_slice(settings, &mut buf).map_err(|_| ConfigError::IoError)?;
        self.put_blob(SETTINGS_NAMESPACE, SETTINGS_KEY, bytes)
            .map_err(|_| ConfigError::IoError)?;
        info!("NvsAdapter: lock settings saved ({} bytes)", bytes.len());
        Ok(())
    }
}
