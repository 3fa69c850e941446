//! Configuration for the cache
//!
//! The freshness threshold lives in an external key-value store reached
//! through [`ConfigStore`]. [`CacheSettings`] carries the runtime settings
//! that are fixed for the lifetime of an index.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use crate::cache::DEFAULT_SEPARATOR;

/// Key under which the freshness threshold (hours) is stored
pub const THRESHOLD_KEY: &str = "actuality";

/// Threshold used when a store has none yet
pub const DEFAULT_THRESHOLD_HOURS: i64 = 24;

/// Name used for XDG directories
const APP_NAME: &str = "artcache";

/// Errors raised by a configuration store
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the backing file failed
    #[error("Config I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing file is not a JSON object of strings
    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A string key-value store holding cache configuration
pub trait ConfigStore {
    /// Returns the value for `key`, if set
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` and returns the value now stored
    fn set(&mut self, key: &str, value: &str) -> Result<String, ConfigError>;
}

/// In-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    values: HashMap<String, String>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a threshold
    pub fn with_threshold(hours: i64) -> Self {
        let mut values = HashMap::new();
        values.insert(THRESHOLD_KEY.to_string(), hours.to_string());
        Self { values }
    }
}

impl ConfigStore for MemoryConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<String, ConfigError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(value.to_string())
    }
}

/// Store persisted as a JSON object in a file
///
/// A missing file is an empty store. Every `set` rewrites the file.
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileConfig {
    /// Loads the store at `path`
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let values: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), ConfigError> {
        let io_err = |source: io::Error| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(&self.path, json).map_err(io_err)
    }
}

impl ConfigStore for FileConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<String, ConfigError> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()?;
        Ok(value.to_string())
    }
}

/// Settings fixed for the lifetime of a cache index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Directory holding cache entries
    pub cache_dir: PathBuf,
    /// Character joining timestamp, name and tags in filenames
    pub separator: char,
}

impl CacheSettings {
    /// Settings for a specific directory with the default separator
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl Default for CacheSettings {
    /// Uses `~/.cache/artcache/` on Linux, or the platform equivalent.
    /// Falls back to `./artcache-cache` when no home directory is known.
    fn default() -> Self {
        let cache_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("artcache-cache"));
        Self::with_dir(cache_dir)
    }
}

/// Default location of the config file (`~/.config/artcache/config.json` on Linux)
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().join("config.json"))
        .unwrap_or_else(|| PathBuf::from("artcache-config.json"))
}
