//! Command-line interface for artcache
//!
//! Parses arguments with clap and runs one cache operation per invocation.
//! Results go to stdout, logs to stderr.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::{parse_timestamp, CacheError, CacheIndex, Clock};
use crate::config::{
    default_config_path, CacheSettings, ConfigError, ConfigStore, FileConfig,
    DEFAULT_THRESHOLD_HOURS, THRESHOLD_KEY,
};
use crate::producer::BytesProducer;

/// Error types for the command-line front end
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--at` value is not a filename timestamp
    #[error("Invalid timestamp: '{0}'. Expected YYYY-MM-DD-HH-MM-SS")]
    InvalidTimestamp(String),

    /// The separator is not a single character
    #[error("Invalid separator: '{0}'. Expected a single character")]
    InvalidSeparator(String),

    /// The source file for `save` cannot be read
    #[error("Failed to read {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// artcache - a filesystem TTL cache for expensive artifacts
#[derive(Parser, Debug)]
#[command(name = "artcache")]
#[command(about = "Save, find and expire timestamped cache artifacts")]
#[command(version)]
pub struct Cli {
    /// Cache directory (defaults to the XDG cache dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Config file holding the freshness threshold
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Character joining timestamp, name and tags in filenames
    #[arg(long, global = true, value_name = "CHAR")]
    pub separator: Option<String>,

    /// Evaluate freshness as of this instant instead of now
    #[arg(long, global = true, value_name = "YYYY-MM-DD-HH-MM-SS")]
    pub at: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Cache operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a copy of a file as a new cache entry
    Save {
        name: String,
        /// Extension including the leading dot, e.g. `.json`
        ext: String,
        /// File whose contents become the artifact
        source: PathBuf,
        tags: Vec<String>,
    },
    /// Print the newest actual entry for a name and exact tags
    Retrieve {
        name: String,
        ext: String,
        tags: Vec<String>,
    },
    /// List all entries, or the actual entries of one name
    List {
        name: Option<String>,
        #[arg(requires = "name")]
        ext: Option<String>,
    },
    /// List entries that expire within the next day
    NearExpiry { name: String, ext: String },
    /// Delete an entry by filename
    Delete { filename: String },
    /// Show or set the freshness threshold in hours
    Threshold { value: Option<String> },
    /// Show every entry with its age and freshness
    Status,
}

/// Parses a `--separator` argument
pub fn parse_separator_arg(s: &str) -> Result<char, CliError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CliError::InvalidSeparator(s.to_string())),
    }
}

/// Parses an `--at` argument into a fixed clock
pub fn parse_clock_arg(at: Option<&str>) -> Result<Clock, CliError> {
    match at {
        None => Ok(Clock::System),
        Some(s) => parse_timestamp(s)
            .map(Clock::Fixed)
            .ok_or_else(|| CliError::InvalidTimestamp(s.to_string())),
    }
}

impl Cli {
    /// Runtime settings derived from the arguments
    pub fn settings(&self) -> Result<CacheSettings, CliError> {
        let mut settings = match &self.dir {
            Some(dir) => CacheSettings::with_dir(dir.clone()),
            None => CacheSettings::default(),
        };
        if let Some(sep) = &self.separator {
            settings.separator = parse_separator_arg(sep)?;
        }
        Ok(settings)
    }

    /// Opens the index described by the arguments
    ///
    /// Seeds the default threshold into a config that has none.
    pub fn open_index(&self) -> Result<CacheIndex<FileConfig>, CliError> {
        let config_path = self.config.clone().unwrap_or_else(default_config_path);
        let mut config = FileConfig::load(config_path)?;
        if config.get(THRESHOLD_KEY).is_none() {
            config.set(THRESHOLD_KEY, &DEFAULT_THRESHOLD_HOURS.to_string())?;
        }

        let clock = parse_clock_arg(self.at.as_deref())?;
        Ok(CacheIndex::new(self.settings()?, config)?.with_clock(clock))
    }
}

/// Runs a command, writing results to `out`
///
/// # Returns
/// * `Ok(true)` when the command produced its result
/// * `Ok(false)` when `retrieve` found nothing actual
pub fn execute<C: ConfigStore, W: Write>(
    index: &mut CacheIndex<C>,
    command: &Command,
    out: &mut W,
) -> Result<bool, CliError> {
    match command {
        Command::Save {
            name,
            ext,
            source,
            tags,
        } => {
            let producer = BytesProducer::from_file(source).map_err(|source_err| CliError::Source {
                path: source.clone(),
                source: source_err,
            })?;
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            let filename = index.save(&producer, name, ext, index.clock().now(), &tags)?;
            writeln!(out, "{}", filename)?;
        }
        Command::Retrieve { name, ext, tags } => {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            match index.retrieve(name, ext, &tags)? {
                Some(filename) => writeln!(out, "{}", filename)?,
                None => return Ok(false),
            }
        }
        Command::List { name, ext } => {
            let files = match (name, ext) {
                (Some(name), Some(ext)) => index.list_actual(name, ext)?,
                (Some(name), None) => index.list_actual(name, "")?,
                _ => index.list_all()?,
            };
            for filename in files {
                writeln!(out, "{}", filename)?;
            }
        }
        Command::NearExpiry { name, ext } => {
            for filename in index.list_near_expiry(name, ext)? {
                writeln!(out, "{}", filename)?;
            }
        }
        Command::Delete { filename } => index.delete(filename)?,
        Command::Threshold { value } => {
            let current = match value {
                Some(value) => index.set_threshold(value)?,
                None => index.get_threshold(),
            };
            writeln!(out, "{}", current.unwrap_or_default())?;
        }
        Command::Status => {
            for filename in index.list_all()? {
                match index.classify(&filename)? {
                    Some(status) => writeln!(
                        out,
                        "{}\t{}h\t{}",
                        status.filename,
                        status.age_hours,
                        status.freshness.label()
                    )?,
                    None => writeln!(out, "{}\t-\tunrecognized", filename)?,
                }
            }
        }
    }
    Ok(true)
}
