//! Persisted key-value settings, kept apart from the user-editable config
//!
//! The credential cache writes through this port, so caching stays testable
//! without a real file system behind it.

use crate::error::Result;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Key-value settings port consumed by the credential resolver
pub trait SettingsStore: Send + Sync {
    /// Read one value
    fn get(&self, key: &str) -> Option<String>;

    /// Write one value in memory; `save` makes it durable
    fn set(&self, key: &str, value: &str);

    /// Flush pending writes
    fn save(&self) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store for tests and one-shot invocations
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }
}

/// TOML-backed store written next to the main configuration file
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing state when present.
    pub fn open(path: PathBuf) -> Result<Self> {
        let values: HashMap<String, String> = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open the store at the default location (`~/.config/picshelf/state.toml`).
    pub fn open_default() -> Result<Self> {
        Self::open(crate::config::get_state_path()?)
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }

    fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(&*lock(&self.values))?;
        fs::write(&self.path, content)?;

        // Cached tokens are credentials; owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}
