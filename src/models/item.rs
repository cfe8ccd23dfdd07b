//! Feed item and snapshot structures.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A canonical feed entry.
///
/// `title` and `description` are plain text by the time an item is built;
/// both ingestion paths run them through the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Item title
    pub title: String,

    /// Link to the paper page
    pub link: String,

    /// Display-joined author list (empty if unknown)
    pub author: String,

    /// Abstract or summary
    pub description: String,

    /// Upstream identifier (not guaranteed unique)
    pub id: String,

    /// Publication time, when the source path provides one
    pub created: Option<DateTime<Utc>>,

    /// Last modification time, when the source path provides one
    pub updated: Option<DateTime<Utc>>,
}

impl Item {
    /// ISO year/week bucket this item belongs to.
    ///
    /// Uses `created`, then `updated`, then the given fallback (normally the
    /// snapshot's own timestamp).
    pub fn week_key(&self, fallback: DateTime<Utc>) -> WeekKey {
        WeekKey::from_datetime(self.created.or(self.updated).unwrap_or(fallback))
    }
}

/// One fully parsed, immutable view of the upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSnapshot {
    items: Vec<Item>,
    updated: DateTime<Utc>,
}

impl FeedSnapshot {
    pub fn new(items: Vec<Item>, updated: DateTime<Utc>) -> Self {
        Self { items, updated }
    }

    /// Items in upstream order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Document-level "last build" time.
    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whole minutes elapsed between the snapshot timestamp and `now`.
    pub fn minutes_since_update(&self, now: DateTime<Utc>) -> i64 {
        (now - self.updated).num_minutes()
    }
}

/// ISO-8601 year and week number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn new(year: i32, week: u32) -> Self {
        Self { year, week }
    }

    /// ISO week of a UTC timestamp.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let iso = at.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Parse a key from the decimal strings of a request path.
    ///
    /// Only the syntax is checked; an out-of-range week is simply a key that
    /// will never be found.
    pub fn parse(year: &str, week: &str) -> Result<Self> {
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::invalid_query(format!("invalid year: {year:?}")))?;
        let week = week
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::invalid_query(format!("invalid week: {week:?}")))?;
        Ok(Self { year, week })
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}
