//! Freshness classification of cache entries
//!
//! Age is whole hours since creation, truncated toward zero. With a threshold
//! of `t` hours an entry is:
//! - `Actual` when `age < t`
//! - `NearExpiry` when it is also within the last day before `t`
//! - `Expired` when `age >= t`

use chrono::NaiveDateTime;

use super::filename::decode_timestamp;

/// Width of the proactive refresh window, in hours
pub const NEAR_EXPIRY_WINDOW_HOURS: i64 = 24;

/// Freshness of one entry relative to a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Usable and not yet due for refresh
    Actual,
    /// Usable, but expires within [`NEAR_EXPIRY_WINDOW_HOURS`]
    NearExpiry,
    /// Age has reached the threshold
    Expired,
}

impl Freshness {
    /// Whether an entry in this state may be served
    pub fn is_usable(self) -> bool {
        !matches!(self, Freshness::Expired)
    }

    /// Short lowercase name for display
    pub fn label(self) -> &'static str {
        match self {
            Freshness::Actual => "actual",
            Freshness::NearExpiry => "near-expiry",
            Freshness::Expired => "expired",
        }
    }
}

/// Whole hours elapsed between `created` and `now`
///
/// Entries dated in the future have a negative age and count as fresh.
pub fn age_hours(created: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - created).num_seconds().div_euclid(3600)
}

/// Classifies an age against a threshold
pub fn classify(age_hours: i64, threshold_hours: i64) -> Freshness {
    if age_hours >= threshold_hours {
        Freshness::Expired
    } else if age_hours >= threshold_hours - NEAR_EXPIRY_WINDOW_HOURS {
        Freshness::NearExpiry
    } else {
        Freshness::Actual
    }
}

/// Freshness of a decoded entry at a given instant
fn entry_freshness(
    filename: &str,
    separator: char,
    threshold_hours: i64,
    now: NaiveDateTime,
) -> Option<Freshness> {
    match decode_timestamp(filename, separator) {
        Ok(created) => {
            let age = age_hours(created, now);
            let freshness = classify(age, threshold_hours);
            tracing::debug!(filename, age, state = freshness.label(), "classified cache entry");
            Some(freshness)
        }
        Err(e) => {
            tracing::warn!("Skipping {}", e);
            None
        }
    }
}

/// First usable entry of a newest-first listing
///
/// Malformed entries are skipped.
pub fn first_usable(
    entries: &[String],
    separator: char,
    threshold_hours: i64,
    now: NaiveDateTime,
) -> Option<String> {
    entries
        .iter()
        .find(|filename| {
            entry_freshness(filename, separator, threshold_hours, now)
                .map(Freshness::is_usable)
                .unwrap_or(false)
        })
        .cloned()
}

/// Prefix of a newest-first listing that precedes the first expired entry
///
/// The listing is trusted to be sorted; an expired entry sorting ahead of
/// fresh ones truncates the result there. Malformed entries are dropped.
pub fn usable_prefix(
    entries: &[String],
    separator: char,
    threshold_hours: i64,
    now: NaiveDateTime,
) -> Vec<String> {
    let mut usable = Vec::new();
    for filename in entries {
        match entry_freshness(filename, separator, threshold_hours, now) {
            Some(Freshness::Expired) => break,
            Some(_) => usable.push(filename.clone()),
            None => continue,
        }
    }
    usable
}

/// Near-expiry entries of a newest-first listing, up to the first expired one
pub fn near_expiry_prefix(
    entries: &[String],
    separator: char,
    threshold_hours: i64,
    now: NaiveDateTime,
) -> Vec<String> {
    let mut due = Vec::new();
    for filename in entries {
        match entry_freshness(filename, separator, threshold_hours, now) {
            Some(Freshness::Expired) => break,
            Some(Freshness::NearExpiry) => due.push(filename.clone()),
            _ => continue,
        }
    }
    due
}
