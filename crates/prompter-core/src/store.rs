//! Durable key/value settings.
//!
//! The session only ever needs three string values, so the store is a flat
//! string map. `FileStore` keeps them in a small TOML file under the cache
//! directory; `MemoryStore` backs tests.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STORE_FILE: &str = "session.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Speed,
    Bookmarks,
    SpeakerAliases,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [StoreKey::Speed, StoreKey::Bookmarks, StoreKey::SpeakerAliases];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Speed => "speed",
            StoreKey::Bookmarks => "bookmarks",
            StoreKey::SpeakerAliases => "speaker-aliases",
        }
    }
}

pub trait KeyValueStore {
    fn get(&self, key: StoreKey) -> Option<String>;
    fn set(&mut self, key: StoreKey, value: String) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail; reads still work.
    pub fn read_only() -> Self {
        Self {
            values: BTreeMap::new(),
            fail_writes: true,
        }
    }

    pub fn with(mut self, key: StoreKey, value: impl Into<String>) -> Self {
        self.values.insert(key.as_str().to_string(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Option<String> {
        self.values.get(key.as_str()).cloned()
    }

    fn set(&mut self, key: StoreKey, value: String) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("store is read-only"));
        }
        self.values.insert(key.as_str().to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    values: BTreeMap<String, String>,
}

impl FileStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(STORE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<StoreFile> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) => {
                debug!(path = %self.path.display(), "Store not readable: {err}");
                return None;
            }
        };
        match toml::from_str(&data) {
            Ok(file) => Some(file),
            Err(err) => {
                debug!(path = %self.path.display(), "Store is not valid TOML: {err}");
                None
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: StoreKey) -> Option<String> {
        self.read()?.values.get(key.as_str()).cloned()
    }

    fn set(&mut self, key: StoreKey, value: String) -> Result<()> {
        let mut file = self.read().unwrap_or_default();
        file.values.insert(key.as_str().to_string(), value);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string(&file).context("Failed to serialize store")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
