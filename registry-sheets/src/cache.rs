//! Time-boxed roster cache in front of the remote read endpoint.
//!
//! One named slot holds a [`CacheEnvelope`]. Reads serve the slot while it is younger
//! than the TTL; every write attempt deletes it. There is no locking across the
//! read-modify-write: concurrent fetches race and the last completion wins.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use registry_core::{
    prepare_for_save, Disposition, DispositionUpdate, Patient, RegistryConfig, RegistryError,
};

use crate::patients_from_response;
use crate::remote::RemoteStore;

/// Snapshot of the full roster at the instant it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEnvelope {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub data: Vec<Patient>,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Named string slots, the shape of browser local storage.
pub trait CacheStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, RegistryError>;
    fn save(&self, key: &str, value: &str) -> Result<(), RegistryError>;
    fn remove(&self, key: &str) -> Result<(), RegistryError>;
}

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, RegistryError> {
        self.slots
            .lock()
            .map_err(|err| RegistryError::Storage(err.to_string()))
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self, key: &str) -> Result<Option<String>, RegistryError> {
        Ok(self.slots()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), RegistryError> {
        self.slots()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), RegistryError> {
        self.slots()?.remove(key);
        Ok(())
    }
}

/// One JSON file per slot under `dir`.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self, key: &str) -> Result<Option<String>, RegistryError> {
        match std::fs::read_to_string(self.slot_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(RegistryError::Storage(err.to_string())),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), RegistryError> {
        std::fs::create_dir_all(&self.dir).map_err(|err| RegistryError::Storage(err.to_string()))?;
        std::fs::write(self.slot_path(key), value)
            .map_err(|err| RegistryError::Storage(err.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), RegistryError> {
        match std::fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(RegistryError::Storage(err.to_string())),
        }
    }
}

/// Roster reads through a TTL cache; writes through the remote with invalidation.
#[derive(Clone)]
pub struct RegistryCache {
    remote: Arc<dyn RemoteStore>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    key: String,
    ttl: Duration,
}

impl RegistryCache {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            remote,
            store,
            clock,
            key: config.cache_key.clone(),
            ttl: config.cache_ttl(),
        }
    }

    /// Current roster. Never fails: transport errors degrade to an empty roster.
    pub async fn fetch(&self) -> Vec<Patient> {
        if let Some(patients) = self.fresh_envelope() {
            return patients;
        }

        let response = match self.remote.fetch_all().await {
            Ok(response) => response,
            Err(err) => {
                error!("Error fetching patients: {err}");
                return Vec::new();
            }
        };

        // Non-success responses are served empty but never cached.
        let cacheable = response.get("status").and_then(Value::as_str) == Some("success");
        let patients = patients_from_response(&response);
        if cacheable {
            self.write_envelope(&patients);
        }
        patients
    }

    /// Drop the cached envelope so the next read goes to the network.
    pub fn invalidate(&self) {
        if let Err(err) = self.store.remove(&self.key) {
            warn!("Failed to clear registry cache: {err}");
        }
    }

    /// Upsert a patient. Returns the record as sent, with generated id fields.
    pub async fn save_patient(&self, patient: Patient) -> Result<Patient, RegistryError> {
        let patient = prepare_for_save(patient, self.clock.now())?;
        let result = self.remote.save(&patient).await;
        self.invalidate();
        result.map(|()| patient).map_err(|err| {
            error!("Error saving patient: {err}");
            err
        })
    }

    pub async fn update_final_disposition(
        &self,
        id: &str,
        disposition: Option<Disposition>,
        date: Option<String>,
    ) -> Result<(), RegistryError> {
        let updates = DispositionUpdate::new(disposition, date);
        let result = self.remote.patch(id, &updates).await;
        self.invalidate();
        result.map_err(|err| {
            error!("Error updating disposition: {err}");
            err
        })
    }

    fn fresh_envelope(&self) -> Option<Vec<Patient>> {
        let raw = match self.store.load(&self.key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("Failed to read registry cache: {err}");
                return None;
            }
        };

        match serde_json::from_str::<CacheEnvelope>(&raw) {
            Ok(envelope) => {
                let age = self.clock.now() - envelope.timestamp;
                if age < self.ttl {
                    debug!("Serving {} patients from cache", envelope.data.len());
                    Some(envelope.data)
                } else {
                    debug!("Registry cache expired");
                    None
                }
            }
            Err(err) => {
                warn!("Invalid cache format, clearing: {err}");
                self.invalidate();
                None
            }
        }
    }

    fn write_envelope(&self, patients: &[Patient]) {
        let envelope = CacheEnvelope {
            timestamp: self.clock.now(),
            data: patients.to_vec(),
        };
        let stored = serde_json::to_string(&envelope)
            .map_err(|err| RegistryError::Parse(err.to_string()))
            .and_then(|raw| self.store.save(&self.key, &raw));
        if let Err(err) = stored {
            warn!("Failed to write registry cache: {err}");
        }
    }
}
