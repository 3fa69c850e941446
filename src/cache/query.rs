//! Directory listing and glob filtering of cache entries
//!
//! Every listing returns bare filenames sorted in descending order, which the
//! fixed-width timestamp prefix makes newest-first. A missing directory lists
//! as empty.

use std::fs;
use std::io;
use std::path::Path;

use globset::{escape, GlobBuilder, GlobMatcher};

use super::filename::tag_suffix;

/// Matches exactly one `YYYY-MM-DD-HH-MM-SS` prefix
const TIMESTAMP_GLOB: &str =
    "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]-[0-9][0-9]-[0-9][0-9]-[0-9][0-9]";

/// Glob for entries of `pattern` with exactly these tags
///
/// The name must follow the timestamp directly, so `pop` never matches
/// `metapop` or a `households_pop` entry.
pub fn exact_glob<S: AsRef<str>>(
    pattern: &str,
    ext: &str,
    separator: char,
    tags: &[S],
) -> String {
    format!(
        "{}{}{}{}{}",
        TIMESTAMP_GLOB,
        escape(&separator.to_string()),
        escape(pattern),
        escape(&tag_suffix(separator, tags)),
        escape(ext)
    )
}

/// Glob for any variant of `pattern`: `*<pattern>*<ext>`
pub fn loose_glob(pattern: &str, ext: &str) -> String {
    format!("*{}*{}", escape(pattern), escape(ext))
}

fn compile(glob: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(glob)
        .literal_separator(true)
        .backslash_escape(false)
        .build()?
        .compile_matcher())
}

/// Names of the regular files directly under `dir`, newest-first
///
/// Entries that vanish or cannot be inspected mid-listing are skipped.
pub fn list_entries(dir: &Path) -> io::Result<Vec<String>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files: Vec<String> = read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();

    files.sort_unstable_by(|a, b| b.cmp(a));
    Ok(files)
}

/// Entries of `dir` matching `glob`, newest-first
pub fn list_matching(dir: &Path, glob: &str) -> Result<Vec<String>, QueryError> {
    let matcher = compile(glob)?;
    let files = list_entries(dir)?
        .into_iter()
        .filter(|name| matcher.is_match(name))
        .collect();
    Ok(files)
}

/// Failure to list a cache directory
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The directory exists but cannot be read
    #[error("Failed to read cache directory: {0}")]
    Io(#[from] io::Error),

    /// A pattern could not be compiled
    #[error("Invalid cache pattern: {0}")]
    Pattern(#[from] globset::Error),
}
