//! Read-notification retention policy
//!
//! Marking a notification read either archives it in the caller's read area
//! or deletes it outright. Archived records older than `max_age` (measured
//! from their `updated_at`) are pruned lazily the next time the owner lists
//! read notifications; an inbox nobody reads keeps expired records until then.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default age after which read notifications may be pruned
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// What happens to a notification when it is marked read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    /// Move it to the read area, keeping it visible in "all" listings
    #[default]
    Archive,
    /// Delete it
    Delete,
}

impl std::str::FromStr for ReadStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" => Ok(Self::Archive),
            "delete" => Ok(Self::Delete),
            other => anyhow::bail!("Unknown read strategy '{other}'. Use 'archive' or 'delete'"),
        }
    }
}

/// Retention settings applied by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub strategy: ReadStrategy,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
            strategy: ReadStrategy::Archive,
        }
    }
}

impl RetentionPolicy {
    /// Whether a read record last updated at `updated_at` is past retention
    pub fn is_expired(&self, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(updated_at) > self.max_age
    }

    pub fn archives(&self) -> bool {
        self.strategy == ReadStrategy::Archive
    }
}

/// Parse duration string into chrono::Duration
///
/// Supports formats like:
/// - "30d" -> 30 days
/// - "720h" -> 720 hours
/// - "2w" -> 2 weeks
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (num_part, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => anyhow::bail!("Duration must have a unit (h, d or w): {s}"),
    };

    let num: i64 = num_part
        .parse()
        .with_context(|| format!("Invalid number in duration: {s}"))?;

    match unit {
        "h" => Ok(Duration::hours(num)),
        "d" => Ok(Duration::days(num)),
        "w" => Ok(Duration::weeks(num)),
        _ => anyhow::bail!("Unknown duration unit '{unit}'. Use 'h', 'd' or 'w'"),
    }
}
