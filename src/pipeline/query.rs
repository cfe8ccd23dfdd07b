// src/pipeline/query.rs

//! Query layer: derived views over a snapshot.
//!
//! Nothing here mutates the store; views are built from the shared snapshot
//! after the read lock has been released.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::error::Result;
use crate::models::{FeedSnapshot, Item};

/// Title of the unfiltered feed.
pub const FULL_FEED_TITLE: &str = "full eprint feed";

/// A derived feed ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedView {
    pub title: String,
    pub link: String,
    pub description: String,
    pub updated: DateTime<Utc>,
    pub items: Vec<Item>,
}

impl FeedView {
    /// Build the keyword-filtered (or full) view of `snapshot`.
    ///
    /// `link` is the public address of the view; `source_url` is the
    /// upstream feed the snapshot came from.
    pub fn build<S: AsRef<str>>(
        snapshot: &FeedSnapshot,
        keywords: &[S],
        show_all: bool,
        link: impl Into<String>,
        source_url: &str,
    ) -> Self {
        Self {
            title: view_title(keywords, show_all),
            link: link.into(),
            description: format!("generated using eprint.fans from {source_url}"),
            updated: snapshot.updated(),
            items: filter_by_keywords(snapshot, keywords, show_all),
        }
    }
}

/// Filter a snapshot by keywords. See [`filter_items`].
pub fn filter_by_keywords<S: AsRef<str>>(
    snapshot: &FeedSnapshot,
    keywords: &[S],
    show_all: bool,
) -> Vec<Item> {
    filter_items(snapshot.items(), keywords, show_all)
}

/// Keep the items matching any keyword, in their original order.
///
/// A keyword matches when it occurs, ignoring case, in the title, the
/// description or the author. Each kept item gets its description prefixed
/// with `[[Triggering Keyword: "<keyword>"]] `, naming the *last* keyword in
/// `keywords` that matched. With `show_all` the keywords are ignored and all
/// items are returned unchanged.
pub fn filter_items<S: AsRef<str>>(items: &[Item], keywords: &[S], show_all: bool) -> Vec<Item> {
    if show_all {
        return items.to_vec();
    }

    items
        .iter()
        .filter_map(|item| {
            let keyword = triggering_keyword(item, keywords)?;
            let mut annotated = item.clone();
            annotated.description = format!(
                "[[Triggering Keyword: \"{}\"]] {}",
                keyword, item.description
            );
            Some(annotated)
        })
        .collect()
}

fn triggering_keyword<'k, S: AsRef<str>>(item: &Item, keywords: &'k [S]) -> Option<&'k str> {
    let title = item.title.to_lowercase();
    let description = item.description.to_lowercase();
    let author = item.author.to_lowercase();

    keywords
        .iter()
        .map(|keyword| keyword.as_ref())
        .filter(|keyword| {
            let needle = keyword.to_lowercase();
            title.contains(&needle) || description.contains(&needle) || author.contains(&needle)
        })
        .last()
}

/// Public link of a feed view, e.g. `https://eprint.fans/feed/?keyword=zk`.
pub fn feed_link<S: AsRef<str>>(base_url: &str, keywords: &[S], show_all: bool) -> Result<String> {
    let mut url = Url::parse(base_url)?.join("/feed/")?;
    {
        let mut query = url.query_pairs_mut();
        for keyword in keywords {
            query.append_pair("keyword", keyword.as_ref());
        }
        if show_all {
            query.append_pair("show_all_items", "true");
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url.to_string())
}

fn view_title<S: AsRef<str>>(keywords: &[S], show_all: bool) -> String {
    if show_all {
        return FULL_FEED_TITLE.to_string();
    }
    let quoted = keywords
        .iter()
        .map(|keyword| keyword.as_ref())
        .collect::<Vec<_>>()
        .join("\", \"");
    format!("custom eprint feed with keywords: \"{quoted}\"")
}
