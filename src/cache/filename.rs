//! Filename codec for cache entries
//!
//! A cache entry is persisted only as its filename:
//! `<timestamp><sep><name>[<sep><tag>]*<ext>`. The timestamp is fixed-width
//! (`YYYY-MM-DD-HH-MM-SS`) so descending string order equals descending
//! chronological order.
//!
//! The separator must not appear inside the name, tags or extension. This is
//! not checked; a tag containing the separator yields ambiguous filenames.

use chrono::NaiveDateTime;
use thiserror::Error;

/// strftime format of the timestamp prefix
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Width of a formatted timestamp
const TIMESTAMP_LEN: usize = 19;

/// Default separator joining timestamp, name and tags
pub const DEFAULT_SEPARATOR: char = '_';

/// A directory entry whose timestamp prefix cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Malformed cache entry '{filename}': timestamp prefix '{prefix}' is not YYYY-MM-DD-HH-MM-SS"
)]
pub struct MalformedEntryError {
    /// The offending filename
    pub filename: String,
    /// The substring that was expected to be a timestamp
    pub prefix: String,
}

/// Formats a timestamp the way it appears in filenames
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a formatted timestamp, requiring the exact fixed width
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if s.len() != TIMESTAMP_LEN {
        return None;
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Builds a filename from an already formatted timestamp
///
/// This is what producers call; they receive the timestamp as a string.
pub fn encode_formatted<S: AsRef<str>>(
    timestamp: &str,
    name: &str,
    ext: &str,
    separator: char,
    tags: &[S],
) -> String {
    let mut filename = String::with_capacity(timestamp.len() + name.len() + ext.len() + 16);
    filename.push_str(timestamp);
    filename.push(separator);
    filename.push_str(name);
    filename.push_str(&tag_suffix(separator, tags));
    filename.push_str(ext);
    filename
}

/// Builds the filename for a cache key
pub fn encode<S: AsRef<str>>(
    timestamp: &NaiveDateTime,
    name: &str,
    ext: &str,
    separator: char,
    tags: &[S],
) -> String {
    encode_formatted(&format_timestamp(timestamp), name, ext, separator, tags)
}

/// `<sep><tag>` for every tag, in order
pub(crate) fn tag_suffix<S: AsRef<str>>(separator: char, tags: &[S]) -> String {
    tags.iter().fold(String::new(), |mut acc, tag| {
        acc.push(separator);
        acc.push_str(tag.as_ref());
        acc
    })
}

/// Recovers the creation timestamp from a filename
///
/// Splits on the first separator and parses the prefix.
pub fn decode_timestamp(
    filename: &str,
    separator: char,
) -> Result<NaiveDateTime, MalformedEntryError> {
    let prefix = filename
        .split_once(separator)
        .map(|(prefix, _)| prefix)
        .unwrap_or(filename);

    parse_timestamp(prefix).ok_or_else(|| MalformedEntryError {
        filename: filename.to_string(),
        prefix: prefix.to_string(),
    })
}
