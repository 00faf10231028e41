//! # Session Storage
//!
//! The one persisted value of the engine: the "intro has played" flag. The
//! store is an explicit trait object handed to the intro controller; hosts
//! back it with browser session storage, a file, or memory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{KineticError, Result};

pub const LOADED_KEY: &str = "loaded";
pub const LOADED_VALUE: &str = "true";

pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Reads the flag. An unavailable store or an empty value reads as "not played".
pub fn intro_played(store: &dyn SessionStore) -> bool {
    match store.get(LOADED_KEY) {
        Ok(value) => value.is_some_and(|v| !v.is_empty()),
        Err(err) => {
            warn!(error = %err, "session store unreadable, intro will play");
            false
        }
    }
}

/// Sets the flag, logging instead of failing when storage is unavailable.
pub fn mark_intro_played(store: &mut dyn SessionStore) -> bool {
    match store.set(LOADED_KEY, LOADED_VALUE) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "could not persist session flag");
            false
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    values: BTreeMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where the intro already played.
    pub fn with_flag() -> Self {
        let mut store = Self::new();
        store
            .values
            .insert(LOADED_KEY.to_string(), LOADED_VALUE.to_string());
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// A JSON object on disk. A missing file is an empty session.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Deletes the backing file, ending the session.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// Storage that is disabled (private mode, sandboxed frames).
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(KineticError::StoreUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
        Err(KineticError::StoreUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<()> {
        Err(KineticError::StoreUnavailable)
    }
}
