// src/services/generic.rs

//! Tolerant ingestion path for feeds already decomposed into entries.
//!
//! Any RSS, Atom or JSON feed understood by `feed-rs` is converted into the
//! canonical item shape, running the same normalization as the line parser.

use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};

use crate::error::{AppError, Result};
use crate::models::{FeedSnapshot, Item};
use crate::services::normalize::{join_authors, sanitize};

/// Decode a feed document of any supported flavor.
pub fn parse_generic(bytes: &[u8]) -> Result<FeedSnapshot> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| AppError::Feed(e.to_string()))?;
    Ok(from_generic_feed(feed))
}

/// Convert a decoded feed into a snapshot.
///
/// The snapshot timestamp is the feed's own `updated`, then `published`, then
/// the newest entry timestamp, then the current time.
pub fn from_generic_feed(feed: Feed) -> FeedSnapshot {
    let items: Vec<Item> = feed.entries.into_iter().map(Item::from).collect();

    let updated = feed
        .updated
        .or(feed.published)
        .or_else(|| newest_entry_time(&items))
        .unwrap_or_else(Utc::now);

    FeedSnapshot::new(items, updated)
}

fn newest_entry_time(items: &[Item]) -> Option<DateTime<Utc>> {
    items.iter().filter_map(|item| item.updated.or(item.created)).max()
}

impl From<Entry> for Item {
    fn from(entry: Entry) -> Self {
        let authors: Vec<String> = entry
            .authors
            .into_iter()
            .map(|person| person.name)
            .collect();

        let description = entry
            .summary
            .map(|text| text.content)
            .or_else(|| entry.content.and_then(|content| content.body))
            .unwrap_or_default();

        Item {
            title: entry
                .title
                .map_or_else(String::new, |text| sanitize(&text.content)),
            link: entry
                .links
                .into_iter()
                .next()
                .map(|link| link.href)
                .unwrap_or_default(),
            author: join_authors(&authors),
            description: sanitize(&description),
            id: entry.id,
            created: entry.published,
            updated: entry.updated,
        }
    }
}
