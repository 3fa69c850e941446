//! artcache - a filesystem-backed TTL cache for expensive artifacts
//!
//! Artifacts are saved as files whose names encode creation time, artifact
//! name and distinguishing tags. Lookups return the newest entry still inside
//! a configurable freshness threshold.

pub mod cache;
pub mod cli;
pub mod config;
pub mod producer;
