//! Producers write artifacts into the cache directory
//!
//! The cache never looks inside artifacts. Anything that can turn a cache key
//! into one file on disk implements [`Producer`] and reports the filename it
//! wrote.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::cache::encode_formatted;

/// Something that can materialize itself as a cache entry
pub trait Producer {
    /// Writes exactly one file into `dir` and returns its filename
    ///
    /// # Arguments
    /// * `dir` - The cache directory
    /// * `name` - Artifact type (e.g., "population")
    /// * `ext` - Extension including the leading dot
    /// * `timestamp` - Creation time, already formatted for filenames
    /// * `separator` - Character joining filename fields
    /// * `tags` - Ordered values distinguishing variants of `name`
    ///
    /// The returned name must match the file written, or the entry will
    /// never be found again.
    fn to_file(
        &self,
        dir: &Path,
        name: &str,
        ext: &str,
        timestamp: &str,
        separator: char,
        tags: &[&str],
    ) -> io::Result<String>;
}

/// Writes a serializable value as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonProducer<'a, T> {
    data: &'a T,
}

impl<'a, T: Serialize> JsonProducer<'a, T> {
    /// Creates a producer that serializes `data`
    pub fn new(data: &'a T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> Producer for JsonProducer<'_, T> {
    fn to_file(
        &self,
        dir: &Path,
        name: &str,
        ext: &str,
        timestamp: &str,
        separator: char,
        tags: &[&str],
    ) -> io::Result<String> {
        let filename = encode_formatted(timestamp, name, ext, separator, tags);

        let json = serde_json::to_string_pretty(self.data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(dir.join(&filename), json)?;
        Ok(filename)
    }
}

/// Writes a byte buffer verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesProducer {
    bytes: Vec<u8>,
}

impl BytesProducer {
    /// Creates a producer for an in-memory buffer
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Producer carrying the contents of an existing file
    pub fn from_file(path: &Path) -> io::Result<Self> {
        Ok(Self::new(fs::read(path)?))
    }
}

impl Producer for BytesProducer {
    fn to_file(
        &self,
        dir: &Path,
        name: &str,
        ext: &str,
        timestamp: &str,
        separator: char,
        tags: &[&str],
    ) -> io::Result<String> {
        let filename = encode_formatted(timestamp, name, ext, separator, tags);
        fs::write(dir.join(&filename), &self.bytes)?;
        Ok(filename)
    }
}
