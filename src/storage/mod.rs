//! In-memory feed store.
//!
//! Owns the current snapshot and the weekly index derived from every
//! snapshot committed so far. Both live behind a single reader-writer lock:
//!
//! - `commit` takes the write lock once, so the snapshot swap and the weekly
//!   merge become visible together.
//! - Readers share the read lock and never see a half-applied commit.
//!
//! Nothing is persisted; the store is rebuilt from upstream on restart.

mod weekly;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{FeedSnapshot, Item, WeekKey};
use crate::pipeline::query;

pub use weekly::{MergeStats, WeeklyIndex};

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    /// Items in the installed snapshot
    pub item_count: usize,
    /// Items added to the weekly index by this commit
    pub newly_indexed: usize,
    /// Distinct weeks the snapshot's items fall into
    pub weeks_touched: usize,
    /// Timestamp of the installed snapshot
    pub updated: DateTime<Utc>,
}

/// One weekly bucket together with the feed's last-updated time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView {
    pub key: WeekKey,
    pub items: Vec<Item>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    snapshot: Option<Arc<FeedSnapshot>>,
    weekly: WeeklyIndex,
}

/// Concurrency-safe holder of the current snapshot and the weekly index.
#[derive(Debug, Default)]
pub struct FeedStore {
    state: RwLock<StoreState>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `snapshot` and merge its items into the weekly index.
    ///
    /// A snapshot whose timestamp is older than the installed one is refused
    /// with `StaleSnapshot` and neither structure changes.
    pub fn commit(&self, snapshot: FeedSnapshot) -> Result<CommitSummary> {
        let mut state = self.write();

        if let Some(current) = &state.snapshot {
            if snapshot.updated() < current.updated() {
                return Err(AppError::StaleSnapshot {
                    current: current.updated(),
                    offered: snapshot.updated(),
                });
            }
        }

        let stats = state.weekly.merge(&snapshot);
        let summary = CommitSummary {
            item_count: snapshot.len(),
            newly_indexed: stats.newly_indexed,
            weeks_touched: stats.weeks_touched,
            updated: snapshot.updated(),
        };
        state.snapshot = Some(Arc::new(snapshot));

        Ok(summary)
    }

    /// Most recently committed snapshot, or `None` before the first commit.
    pub fn current_snapshot(&self) -> Option<Arc<FeedSnapshot>> {
        self.read().snapshot.clone()
    }

    /// Like `current_snapshot`, but an unpopulated store is an error.
    pub fn require_snapshot(&self) -> Result<Arc<FeedSnapshot>> {
        self.current_snapshot().ok_or(AppError::Unavailable)
    }

    pub fn is_populated(&self) -> bool {
        self.read().snapshot.is_some()
    }

    /// Items of one weekly bucket, or `None` if no item ever fell into it.
    pub fn week_bucket(&self, key: WeekKey) -> Option<Vec<Item>> {
        self.read().weekly.bucket(key).map(<[Item]>::to_vec)
    }

    /// A weekly bucket and the snapshot timestamp, read in one critical section.
    pub fn week_view(&self, key: WeekKey) -> Option<WeekView> {
        let state = self.read();
        let snapshot = state.snapshot.as_ref()?;
        let items = state.weekly.bucket(key)?.to_vec();
        Some(WeekView {
            key,
            items,
            last_updated: snapshot.updated(),
        })
    }

    /// Known weekly buckets in ascending order.
    pub fn weeks(&self) -> Vec<WeekKey> {
        self.read().weekly.weeks().collect()
    }

    /// Keyword-filtered items of the current snapshot.
    ///
    /// With `show_all` every item is returned unmodified.
    pub fn filter_by_keywords<S: AsRef<str>>(
        &self,
        keywords: &[S],
        show_all: bool,
    ) -> Result<Vec<Item>> {
        let snapshot = self.require_snapshot()?;
        Ok(query::filter_items(snapshot.items(), keywords, show_all))
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_item(id: &str, created: DateTime<Utc>) -> Item {
        Item {
            title: format!("Paper {id}"),
            link: format!("https://eprint.iacr.org/{id}"),
            author: "Alice".into(),
            description: "Abstract".into(),
            id: format!("https://eprint.iacr.org/{id}"),
            created: Some(created),
            updated: None,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_store_is_unavailable() {
        let store = FeedStore::new();
        assert!(!store.is_populated());
        assert!(store.current_snapshot().is_none());
        assert!(matches!(store.require_snapshot(), Err(AppError::Unavailable)));
        assert!(matches!(
            store.filter_by_keywords(&["lattice"], false),
            Err(AppError::Unavailable)
        ));
        assert!(store.week_bucket(WeekKey::new(2022, 10)).is_none());
        assert!(store.week_view(WeekKey::new(2022, 10)).is_none());
    }

    #[test]
    fn test_commit_installs_snapshot_and_index() {
        let store = FeedStore::new();
        let snapshot = FeedSnapshot::new(vec![make_item("2022/1", at(7))], at(8));

        let summary = store.commit(snapshot.clone()).unwrap();
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.newly_indexed, 1);
        assert_eq!(summary.weeks_touched, 1);
        assert_eq!(summary.updated, at(8));

        assert_eq!(*store.current_snapshot().unwrap(), snapshot);
        let view = store.week_view(WeekKey::new(2022, 10)).unwrap();
        assert_eq!(view.items, snapshot.items());
        assert_eq!(view.last_updated, at(8));
    }

    #[test]
    fn test_overlapping_commits_do_not_duplicate() {
        let store = FeedStore::new();
        let first = FeedSnapshot::new(
            vec![make_item("2022/1", at(7)), make_item("2022/2", at(8))],
            at(8),
        );
        let second = FeedSnapshot::new(
            vec![make_item("2022/2", at(8)), make_item("2022/3", at(9))],
            at(9),
        );

        store.commit(first).unwrap();
        let summary = store.commit(second.clone()).unwrap();

        assert_eq!(summary.newly_indexed, 1);
        assert_eq!(*store.current_snapshot().unwrap(), second);

        // The week keeps the item that dropped out of the feed.
        let bucket = store.week_bucket(WeekKey::new(2022, 10)).unwrap();
        let ids: Vec<_> = bucket.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://eprint.iacr.org/2022/1",
                "https://eprint.iacr.org/2022/2",
                "https://eprint.iacr.org/2022/3",
            ]
        );
    }

    #[test]
    fn test_stale_commit_is_rejected() {
        let store = FeedStore::new();
        let newer = FeedSnapshot::new(vec![make_item("2022/1", at(7))], at(9));
        let older = FeedSnapshot::new(vec![make_item("2022/9", at(14))], at(8));

        store.commit(newer.clone()).unwrap();
        let err = store.commit(older).unwrap_err();

        assert!(matches!(err, AppError::StaleSnapshot { .. }));
        assert_eq!(*store.current_snapshot().unwrap(), newer);
        assert!(store.week_bucket(WeekKey::new(2022, 11)).is_none());
        assert_eq!(store.weeks(), vec![WeekKey::new(2022, 10)]);
    }

    #[test]
    fn test_equal_timestamp_commit_is_accepted() {
        let store = FeedStore::new();
        let first = FeedSnapshot::new(vec![make_item("2022/1", at(7))], at(8));
        let second = FeedSnapshot::new(vec![make_item("2022/2", at(7))], at(8));

        store.commit(first).unwrap();
        assert!(store.commit(second).is_ok());
        assert_eq!(store.week_bucket(WeekKey::new(2022, 10)).unwrap().len(), 2);
    }

    #[test]
    fn test_filter_through_store() {
        let store = FeedStore::new();
        store
            .commit(FeedSnapshot::new(
                vec![make_item("2022/1", at(7)), make_item("2022/2", at(7))],
                at(8),
            ))
            .unwrap();

        let all = store.filter_by_keywords::<&str>(&[], true).unwrap();
        assert_eq!(all.len(), 2);

        let matched = store.filter_by_keywords(&["2022/2"], false).unwrap();
        assert_eq!(matched.len(), 1);
        assert!(matched[0].description.starts_with("[[Triggering Keyword: \"2022/2\"]] "));
    }
}
