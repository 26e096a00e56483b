//! Device-local session cache: wall unlock flags, cached wall passwords and
//! the anonymous visitor id.
//!
//! The cache is advisory. The backend re-checks the password on every
//! protected read, so losing or tampering with it only costs a re-prompt.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ClientError, Result};

pub const VISITOR_ID_KEY: &str = "visitor_id";

/// Narrow key-value interface over whatever the device offers for
/// persistent storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // The maps hold plain strings; a panic mid-update cannot leave them
    // inconsistent, so a poisoned lock is still usable.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Process-lifetime store. Used in tests and for throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// JSON file store. Every write rewrites the whole file through a
/// temporary sibling so a crash never leaves it half-written.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ClientError::Storage(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ClientError::Storage(format!("{}: {}", path.display(), e))),
        };

        info!("Session cache loaded from {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let storage_err = |e: std::io::Error| ClientError::Storage(format!("{}: {}", self.path.display(), e));

        let json = serde_json::to_vec_pretty(entries).map_err(|e| ClientError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(storage_err)?;
        std::fs::rename(&tmp, &self.path).map_err(storage_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

/// Typed view over a [`KeyValueStore`] that knows the key layout.
pub struct SessionCache<S> {
    store: S,
}

impl<S: KeyValueStore> SessionCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_unlocked(&self, wall_id: Uuid) -> bool {
        self.store.get(&session_key(wall_id)).as_deref() == Some("true")
    }

    pub fn cached_password(&self, wall_id: Uuid) -> Option<String> {
        self.store.get(&password_key(wall_id))
    }

    /// Record a verified unlock. Only call after the backend confirmed it.
    pub fn remember_unlock(&self, wall_id: Uuid, password: Option<&str>) -> Result<()> {
        if let Some(password) = password {
            self.store.set(&password_key(wall_id), password)?;
        }
        self.store.set(&session_key(wall_id), "true")?;
        debug!("Wall {} unlocked on this device", wall_id);
        Ok(())
    }

    pub fn forget(&self, wall_id: Uuid) -> Result<()> {
        self.store.remove(&session_key(wall_id))?;
        self.store.remove(&password_key(wall_id))
    }

    /// Persistent anonymous identity, created on first use.
    pub fn visitor_id(&self) -> Result<Uuid> {
        if let Some(id) = self.store.get(VISITOR_ID_KEY).and_then(|v| v.parse().ok()) {
            return Ok(id);
        }

        let id = Uuid::new_v4();
        self.store.set(VISITOR_ID_KEY, &id.to_string())?;
        info!("Generated visitor id {}", id);
        Ok(id)
    }
}

fn session_key(wall_id: Uuid) -> String {
    format!("wall-session-{}", wall_id)
}

fn password_key(wall_id: Uuid) -> String {
    format!("wall-password-{}", wall_id)
}
