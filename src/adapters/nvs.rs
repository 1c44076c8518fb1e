//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`].  The controller
//! config is a postcard blob in its own namespace; the device store lives
//! wherever the caller puts it.  Every config field is range-checked
//! before it is written, and a stored config that fails the same checks
//! reads back as corrupted.
//!
//! On ESP-IDF the default NVS partition is taken once and a namespace
//! handle is opened per operation (commits are atomic per handle).  The
//! host build keeps blobs in memory, keyed by `(namespace, key)`.

use log::info;

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::ControllerConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{EspError, ESP_ERR_NVS_NOT_ENOUGH_SPACE};

const CONFIG_NAMESPACE: &str = "relaymini";
const CONFIG_KEY: &str = "ctlcfg";

/// Largest blob accepted in one entry.
const MAX_BLOB_SIZE: usize = 16 * 1024;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    partition: EspDefaultNvsPartition,
    #[cfg(not(target_os = "espidf"))]
    blobs: std::cell::RefCell<std::collections::BTreeMap<(String, String), Vec<u8>>>,
}

impl NvsAdapter {
    /// Take the default partition.  A full or outdated partition is erased
    /// and re-initialised by the partition driver.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, ConfigError> {
        let partition = EspDefaultNvsPartition::take().map_err(|e| {
            log::warn!("NVS: partition init failed: {}", e);
            ConfigError::IoError
        })?;
        info!("NvsAdapter: default partition ready");
        Ok(Self { partition })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsAdapter: simulation backend");
        Ok(Self {
            blobs: std::cell::RefCell::default(),
        })
    }

    // ── backend primitives ────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn open(&self, namespace: &str, write: bool) -> Result<EspNvs<NvsDefault>, EspError> {
        EspNvs::new(self.partition.clone(), namespace, write)
    }

    #[cfg(target_os = "espidf")]
    fn get(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let nvs = match self.open(namespace, false) {
            Ok(nvs) => nvs,
            // A namespace nobody has written yet cannot be opened read-only.
            Err(_) => return Err(StorageError::NotFound),
        };
        let len = nvs
            .blob_len(key)
            .map_err(|_| StorageError::IoError)?
            .ok_or(StorageError::NotFound)?;
        if len > MAX_BLOB_SIZE {
            return Err(StorageError::TooLarge);
        }
        let mut buf = vec![0u8; len];
        let read = nvs
            .get_blob(key, &mut buf)
            .map_err(|_| StorageError::IoError)?
            .ok_or(StorageError::NotFound)?
            .len();
        buf.truncate(read);
        Ok(buf)
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .borrow()
            .get(&(namespace.to_owned(), key.to_owned()))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    #[cfg(target_os = "espidf")]
    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let write = || -> Result<(), EspError> {
            let mut nvs = self.open(namespace, true)?;
            nvs.set_blob(key, data)
        };
        write().map_err(|e| {
            if e.code() == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                StorageError::Full
            } else {
                log::warn!("NVS: write {}::{} failed: {}", namespace, key, e);
                StorageError::IoError
            }
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .borrow_mut()
            .insert((namespace.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn remove(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let mut nvs = self
            .open(namespace, true)
            .map_err(|_| StorageError::IoError)?;
        nvs.remove(key).map_err(|_| StorageError::IoError)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn remove(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.blobs
            .borrow_mut()
            .remove(&(namespace.to_owned(), key.to_owned()));
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn contains(&self, namespace: &str, key: &str) -> bool {
        self.open(namespace, false)
            .and_then(|nvs| nvs.contains(key))
            .unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn contains(&self, namespace: &str, key: &str) -> bool {
        self.blobs
            .borrow()
            .contains_key(&(namespace.to_owned(), key.to_owned()))
    }
}

fn validate_config(cfg: &ControllerConfig) -> Result<(), ConfigError> {
    let fail = |why| Err(ConfigError::ValidationFailed(why));
    if !(100..=60_000).contains(&cfg.control_cycle_ms) {
        return fail("control_cycle_ms must be 100..=60000");
    }
    if cfg.pid_window_ms < cfg.control_cycle_ms || cfg.pid_window_ms > 600_000 {
        return fail("pid_window_ms must be control_cycle_ms..=600000");
    }
    if !(1..=100).contains(&cfg.smoothing_step_percent) {
        return fail("smoothing_step_percent must be 1..=100");
    }
    if cfg.autosave_delay_ms > 600_000 {
        return fail("autosave_delay_ms must be at most 600000");
    }
    if !(1024..=MAX_BLOB_SIZE as u32).contains(&cfg.max_document_bytes) {
        return fail("max_document_bytes must be 1024..=16384");
    }
    if !(2000..=2100).contains(&cfg.clock_min_year) {
        return fail("clock_min_year must be 2000..=2100");
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        let bytes = match self.get(CONFIG_NAMESPACE, CONFIG_KEY) {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                return Ok(ControllerConfig::default());
            }
            Err(_) => return Err(ConfigError::IoError),
        };
        let cfg: ControllerConfig =
            postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg).map_err(|_| ConfigError::Corrupted)?;
        Ok(cfg)
    }

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        match self.put(CONFIG_NAMESPACE, CONFIG_KEY, &bytes) {
            Ok(()) => {
                info!("NvsAdapter: config saved ({} bytes)", bytes.len());
                Ok(())
            }
            Err(StorageError::Full) => Err(ConfigError::StorageFull),
            Err(_) => Err(ConfigError::IoError),
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.get(namespace, key)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::TooLarge);
        }
        self.put(namespace, key, data)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.remove(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.contains(namespace, key)
    }
}
