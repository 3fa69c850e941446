//! Filesystem-backed TTL cache
//!
//! Entries are plain files whose names encode their creation time, artifact
//! name and distinguishing tags. The index lists, filters and ages them by
//! filename alone; artifact contents are written by a [`crate::producer::Producer`]
//! and never read back by the cache.

mod filename;
mod freshness;
mod index;
mod query;

pub use filename::{
    decode_timestamp, encode, encode_formatted, format_timestamp, parse_timestamp,
    MalformedEntryError, DEFAULT_SEPARATOR, TIMESTAMP_FORMAT,
};
pub use freshness::{age_hours, classify, Freshness, NEAR_EXPIRY_WINDOW_HOURS};
pub use index::{CacheError, CacheIndex, Clock, EntryStatus};
pub use query::{exact_glob, loose_glob, QueryError};
