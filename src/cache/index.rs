//! Cache index over a single directory
//!
//! Provides a `CacheIndex` that saves artifacts through a producer and finds
//! the newest entry still inside the freshness threshold.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::filename::{decode_timestamp, encode, format_timestamp};
use super::freshness::{self, Freshness};
use super::query::{self, QueryError};
use crate::config::{CacheSettings, ConfigError, ConfigStore, THRESHOLD_KEY};
use crate::producer::Producer;

/// Errors that can occur when using the cache index
#[derive(Debug, Error)]
pub enum CacheError {
    /// Creating or reading the cache directory failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// Listing or filtering the directory failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The producer failed to write the artifact
    #[error("Producer failed to write artifact: {0}")]
    Producer(#[source] io::Error),

    /// An entry with the same name already exists
    #[error("Cache entry '{0}' already exists")]
    Collision(String),

    /// The config store holds no threshold
    #[error("Freshness threshold is not set (config key 'actuality')")]
    ThresholdNotSet,

    /// The stored threshold is not a whole number of hours
    #[error("Invalid freshness threshold '{0}': expected whole hours")]
    InvalidThreshold(String),

    /// A name that does not denote a file directly inside the cache directory
    #[error("Invalid cache filename: '{0}'")]
    InvalidFilename(String),

    /// The config store failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Source of the current time used for ageing entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Local wall clock
    #[default]
    System,
    /// A fixed instant
    Fixed(NaiveDateTime),
}

impl Clock {
    /// Current instant at second precision, matching filename timestamps
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => {
                let now = Local::now().naive_local();
                now.with_nanosecond(0).unwrap_or(now)
            }
            Clock::Fixed(at) => *at,
        }
    }
}

/// Decoded state of a single cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    /// The entry's filename
    pub filename: String,
    /// Creation time decoded from the filename
    pub created: NaiveDateTime,
    /// Whole hours since creation
    pub age_hours: i64,
    /// Classification against the current threshold
    pub freshness: Freshness,
}

/// Indexes the cache entries of one directory
///
/// Every operation re-reads the directory and the threshold; nothing is held
/// in memory between calls. Files that don't follow the naming convention
/// are ignored.
#[derive(Debug, Clone)]
pub struct CacheIndex<C> {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    separator: char,
    config: C,
    clock: Clock,
}

impl<C: ConfigStore> CacheIndex<C> {
    /// Creates an index, creating the cache directory if missing
    ///
    /// # Returns
    /// * `Ok(CacheIndex)` on success
    /// * `Err` if the directory cannot be created
    pub fn new(settings: CacheSettings, config: C) -> Result<Self, CacheError> {
        let index = Self {
            cache_dir: settings.cache_dir,
            separator: settings.separator,
            config,
            clock: Clock::System,
        };
        index.ensure_dir()?;
        Ok(index)
    }

    /// Creates an index over `cache_dir` using the default separator
    pub fn with_dir(cache_dir: impl Into<PathBuf>, config: C) -> Result<Self, CacheError> {
        Self::new(CacheSettings::with_dir(cache_dir), config)
    }

    /// Replaces the clock used to age entries
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Directory holding the cache entries
    pub fn directory(&self) -> &Path {
        &self.cache_dir
    }

    /// Character joining timestamp, name and tags in filenames
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Clock used to age entries and stamp new ones
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// The config store holding the threshold
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Absolute path of an entry
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    /// Saves an artifact through `producer`
    ///
    /// # Arguments
    /// * `producer` - Writes the artifact file
    /// * `name` - Artifact type (e.g., "population")
    /// * `ext` - Extension including the leading dot (e.g., ".json")
    /// * `timestamp` - Creation time recorded in the filename
    /// * `tags` - Ordered values distinguishing variants of `name`
    ///
    /// # Returns
    /// * `Ok(filename)` as reported by the producer
    /// * `Err(CacheError::Collision)` if an entry with the same name exists;
    ///   the producer is not called and nothing is overwritten
    /// * `Err(CacheError::Producer)` if the producer failed
    pub fn save<P: Producer + ?Sized>(
        &self,
        producer: &P,
        name: &str,
        ext: &str,
        timestamp: NaiveDateTime,
        tags: &[&str],
    ) -> Result<String, CacheError> {
        let expected = encode(&timestamp, name, ext, self.separator, tags);
        if self.path_of(&expected).exists() {
            warn!("Refusing to overwrite existing cache entry {}", expected);
            return Err(CacheError::Collision(expected));
        }

        let formatted = format_timestamp(&timestamp);
        let filename = producer
            .to_file(&self.cache_dir, name, ext, &formatted, self.separator, tags)
            .map_err(CacheError::Producer)?;

        if filename != expected {
            warn!(
                "Producer wrote {} but the cache key encodes {}; retrieval may not find it",
                filename, expected
            );
        }
        info!("Saved cache entry {}", filename);
        Ok(filename)
    }

    /// Filename of the newest actual entry for `pattern` with exactly `tags`
    ///
    /// # Returns
    /// * `Ok(Some(filename))` if an entry younger than the threshold exists
    /// * `Ok(None)` if nothing qualifies; the caller should recompute
    pub fn retrieve(
        &self,
        pattern: &str,
        ext: &str,
        tags: &[&str],
    ) -> Result<Option<String>, CacheError> {
        let threshold = self.threshold_hours()?;
        let glob = query::exact_glob(pattern, ext, self.separator, tags);
        let files = query::list_matching(&self.cache_dir, &glob)?;
        info!("found files for pattern {} with args {:?}: {:?}", pattern, tags, files);

        let found = freshness::first_usable(&files, self.separator, threshold, self.clock.now());
        match &found {
            Some(filename) => info!("Found cached file - {}", filename),
            None => debug!("No actual cache entry for {}", glob),
        }
        Ok(found)
    }

    /// Every non-expired entry of `pattern`, regardless of tags, newest-first
    ///
    /// Stops at the first expired entry in sort order.
    pub fn list_actual(&self, pattern: &str, ext: &str) -> Result<Vec<String>, CacheError> {
        let threshold = self.threshold_hours()?;
        let files = query::list_matching(&self.cache_dir, &query::loose_glob(pattern, ext))?;
        Ok(freshness::usable_prefix(&files, self.separator, threshold, self.clock.now()))
    }

    /// Entries of `pattern` that expire within the next day, newest-first
    ///
    /// Meant for refreshing artifacts in the background before they go stale.
    pub fn list_near_expiry(&self, pattern: &str, ext: &str) -> Result<Vec<String>, CacheError> {
        let threshold = self.threshold_hours()?;
        let files = query::list_matching(&self.cache_dir, &query::loose_glob(pattern, ext))?;
        Ok(freshness::near_expiry_prefix(&files, self.separator, threshold, self.clock.now()))
    }

    /// Every file in the cache directory, newest-first
    pub fn list_all(&self) -> Result<Vec<String>, CacheError> {
        Ok(query::list_entries(&self.cache_dir)?)
    }

    /// Decodes and classifies one entry at the current time
    ///
    /// Returns `Ok(None)` for files that don't follow the naming convention.
    pub fn classify(&self, filename: &str) -> Result<Option<EntryStatus>, CacheError> {
        let threshold = self.threshold_hours()?;
        let created = match decode_timestamp(filename, self.separator) {
            Ok(created) => created,
            Err(e) => {
                debug!("{}", e);
                return Ok(None);
            }
        };
        let age_hours = freshness::age_hours(created, self.clock.now());
        Ok(Some(EntryStatus {
            filename: filename.to_string(),
            created,
            age_hours,
            freshness: freshness::classify(age_hours, threshold),
        }))
    }

    /// Deletes an entry by exact filename
    ///
    /// An empty name or a file that doesn't exist is a no-op.
    pub fn delete(&self, filename: &str) -> Result<(), CacheError> {
        if filename.is_empty() {
            return Ok(());
        }
        if Path::new(filename).file_name().and_then(|n| n.to_str()) != Some(filename) {
            return Err(CacheError::InvalidFilename(filename.to_string()));
        }

        let path = self.path_of(filename);
        if !path.is_file() {
            return Ok(());
        }

        info!("Deleting {}", filename);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Raw threshold value from the config store
    pub fn get_threshold(&self) -> Option<String> {
        self.config.get(THRESHOLD_KEY)
    }

    /// Stores a new threshold and returns the value read back
    pub fn set_threshold(&mut self, value: &str) -> Result<Option<String>, CacheError> {
        self.config.set(THRESHOLD_KEY, value)?;
        Ok(self.get_threshold())
    }

    /// Threshold in hours, parsed at every use
    pub fn threshold_hours(&self) -> Result<i64, CacheError> {
        let raw = self.get_threshold().ok_or(CacheError::ThresholdNotSet)?;
        raw.trim()
            .parse()
            .map_err(|_| CacheError::InvalidThreshold(raw.clone()))
    }
}
