use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Key/value settings persistence.
///
/// Typed getters degrade gracefully: a missing key or a value of the wrong
/// JSON type yields the supplied default instead of an error, so corrupt or
/// stale settings can never take the scroll loop down.
pub trait SettingsStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<Value>;
    fn set_raw(&self, key: &str, value: Value) -> Result<()>;

    fn get_f32(&self, key: &str, default: f32) -> f32 {
        self.get_raw(key)
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(default)
    }

    fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.get_raw(key).and_then(|v| v.as_u64()).unwrap_or(default)
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_raw(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.get_raw(key)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| default.to_string())
    }

    /// Deserializes a structured value; `None` when absent or malformed.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        self.get_raw(key)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        self.set_raw(key, serde_json::to_value(value)?)
    }
}

/// Volatile in-memory store, used by tests and as the default when the host
/// supplies nothing better.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Stores settings as a single flat JSON object on disk, written back on
/// every set. Load failures start from an empty map rather than erroring.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Settings file {} is malformed ({}), starting fresh", path.display(), e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Opens the store at the platform config directory,
    /// e.g. `~/.config/panelpace/settings.json`.
    pub fn open_default() -> Result<Self> {
        let mut dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("No config directory on this platform"))?;
        dir.push("panelpace");
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Self::open(dir.join("settings.json"))
    }

    fn flush(&self, entries: &HashMap<String, Value>) -> Result<()> {
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }
}
