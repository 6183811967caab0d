//! Shared runtime configuration store.
//!
//! The control loop and the MQTT callback thread both touch the live
//! [`IrrigationConfig`]; this store serializes them behind one mutex.
//! Readers take a cheap per-tick [`snapshot`](ConfigStore::snapshot)
//! copy.  Writers go through
//! [`apply_and_persist`](ConfigStore::apply_and_persist), which holds
//! the lock across validate → apply → persist so a reader can never
//! observe a config that was neither fully applied nor rolled back.

use std::sync::{Mutex, PoisonError};

use log::{info, warn};

use crate::app::ports::{ConfigPort, StorageError};
use crate::config::IrrigationConfig;
use crate::error::{Error, Result};

pub struct ConfigStore {
    inner: Mutex<IrrigationConfig>,
}

impl ConfigStore {
    pub fn new(initial: IrrigationConfig) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    /// Copy of the live configuration.
    pub fn snapshot(&self) -> IrrigationConfig {
        *self.lock()
    }

    /// Validate `candidate`, make it live, and persist it.
    ///
    /// On a persistence failure the previous configuration is restored
    /// before the lock is released; a candidate that was not durably
    /// stored is never left live.
    pub fn apply_and_persist(
        &self,
        candidate: IrrigationConfig,
        port: &impl ConfigPort,
    ) -> Result<()> {
        candidate.validate()?;

        let mut live = self.lock();
        let previous = *live;
        *live = candidate;

        if let Err(e) = port.save(&candidate) {
            *live = previous;
            warn!("config persist failed ({e}), previous config restored");
            return Err(Error::Persistence(e));
        }

        info!("config applied and persisted");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IrrigationConfig> {
        // A poisoned lock means a panic elsewhere; the config itself is
        // a plain Copy value and is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Boot-time load: stored configuration if present and sane, otherwise
/// compiled-in defaults.
pub fn load_or_default(port: &impl ConfigPort) -> IrrigationConfig {
    match port.load() {
        Ok(stored) => match stored.validate() {
            Ok(()) => {
                info!("configuration restored from flash");
                stored
            }
            Err(violation) => {
                warn!("stored configuration fails sanity check ({violation}), using defaults");
                IrrigationConfig::default()
            }
        },
        Err(StorageError::NotFound) => {
            info!("no stored configuration, using defaults");
            IrrigationConfig::default()
        }
        Err(e) => {
            warn!("configuration load failed ({e}), using defaults");
            IrrigationConfig::default()
        }
    }
}
