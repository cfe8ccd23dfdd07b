//! Readers racing a writer must only ever see whole commits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use eprint_feed::models::{FeedSnapshot, Item, WeekKey};
use eprint_feed::storage::FeedStore;

const COMMITS: i64 = 200;
const READERS: usize = 4;

fn t0() -> DateTime<Utc> {
    // Monday of ISO week 10, 2022
    Utc.with_ymd_and_hms(2022, 3, 7, 0, 0, 0).unwrap()
}

fn make_item(n: i64) -> Item {
    Item {
        title: format!("Paper {n}"),
        link: format!("https://eprint.iacr.org/2022/{n}"),
        author: String::new(),
        description: String::new(),
        id: format!("https://eprint.iacr.org/2022/{n}"),
        created: Some(t0() + Duration::minutes(n)),
        updated: None,
    }
}

/// Snapshot `n` holds items `1..=n` and is stamped `t0 + n` minutes.
fn snapshot(n: i64) -> FeedSnapshot {
    FeedSnapshot::new((1..=n).map(make_item).collect(), t0() + Duration::minutes(n))
}

#[test]
fn test_readers_see_consistent_week_views() {
    let store = Arc::new(FeedStore::new());
    let done = AtomicBool::new(false);
    let week = WeekKey::new(2022, 10);

    thread::scope(|scope| {
        for _ in 0..READERS {
            scope.spawn(|| {
                let mut observed = 0;
                while !done.load(Ordering::Acquire) {
                    if let Some(view) = store.week_view(week) {
                        let minutes = (view.last_updated - t0()).num_minutes();
                        assert_eq!(view.items.len() as i64, minutes);
                        assert!(minutes >= observed, "store went backwards");
                        observed = minutes;
                    }
                }
            });
        }

        scope.spawn(|| {
            for n in 1..=COMMITS {
                store.commit(snapshot(n)).unwrap();
            }
            done.store(true, Ordering::Release);
        });
    });

    let bucket = store.week_bucket(week).unwrap();
    assert_eq!(bucket.len() as i64, COMMITS);
    assert_eq!(store.current_snapshot().unwrap().len() as i64, COMMITS);
}

#[test]
fn test_concurrent_filters_during_commits() {
    let store = Arc::new(FeedStore::new());
    store.commit(snapshot(1)).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(Ordering::Acquire) {
                let snapshot = store.require_snapshot().unwrap();
                let matched = store.filter_by_keywords(&["paper"], false).unwrap();
                // Filtering sees one snapshot; a later one only adds items.
                assert!(matched.len() >= snapshot.len());
            }
        });

        scope.spawn(|| {
            for n in 2..=COMMITS {
                store.commit(snapshot(n)).unwrap();
            }
            done.store(true, Ordering::Release);
        });
    });

    let matched = store.filter_by_keywords(&["paper"], false).unwrap();
    assert_eq!(matched.len() as i64, COMMITS);
}
