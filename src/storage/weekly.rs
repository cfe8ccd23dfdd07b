//! Weekly index: items accumulated per ISO year and week.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{FeedSnapshot, Item, WeekKey};

/// Result of merging one snapshot into the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Items appended to a bucket for the first time
    pub newly_indexed: usize,
    /// Distinct buckets the snapshot's items fall into
    pub weeks_touched: usize,
}

/// Items bucketed by ISO year, then ISO week.
///
/// The index only grows: buckets are created on first sighting, an item is
/// appended to its bucket unless an equal item is already there, and nothing
/// is ever removed.
#[derive(Debug, Clone, Default)]
pub struct WeeklyIndex {
    years: BTreeMap<i32, BTreeMap<u32, Vec<Item>>>,
}

impl WeeklyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge every item of `snapshot` into its bucket.
    pub fn merge(&mut self, snapshot: &FeedSnapshot) -> MergeStats {
        let mut touched = BTreeSet::new();
        let mut newly_indexed = 0;

        for item in snapshot.items() {
            let key = item.week_key(snapshot.updated());
            touched.insert(key);
            if self.insert(key, item) {
                newly_indexed += 1;
            }
        }

        MergeStats {
            newly_indexed,
            weeks_touched: touched.len(),
        }
    }

    /// Append `item` to the bucket for `key` unless an equal item is present.
    ///
    /// Returns whether the item was appended.
    pub fn insert(&mut self, key: WeekKey, item: &Item) -> bool {
        let bucket = self
            .years
            .entry(key.year)
            .or_default()
            .entry(key.week)
            .or_default();

        if bucket.contains(item) {
            return false;
        }
        bucket.push(item.clone());
        true
    }

    pub fn bucket(&self, key: WeekKey) -> Option<&[Item]> {
        self.years
            .get(&key.year)
            .and_then(|weeks| weeks.get(&key.week))
            .map(Vec::as_slice)
    }

    /// All known buckets in ascending order.
    pub fn weeks(&self) -> impl Iterator<Item = WeekKey> + '_ {
        self.years.iter().flat_map(|(&year, weeks)| {
            weeks.keys().map(move |&week| WeekKey::new(year, week))
        })
    }

    /// Total number of indexed items across all buckets.
    pub fn item_count(&self) -> usize {
        self.years
            .values()
            .flat_map(|weeks| weeks.values())
            .map(Vec::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn make_item(id: &str, created: DateTime<Utc>) -> Item {
        Item {
            title: format!("Paper {id}"),
            link: format!("https://eprint.iacr.org/{id}"),
            author: String::new(),
            description: "Abstract".into(),
            id: format!("https://eprint.iacr.org/{id}"),
            created: Some(created),
            updated: None,
        }
    }

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 3, 7, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_merge_buckets_by_iso_week() {
        let next_week = monday() + chrono::Duration::days(7);
        let snapshot = FeedSnapshot::new(
            vec![
                make_item("2022/1", monday()),
                make_item("2022/2", monday()),
                make_item("2022/3", next_week),
            ],
            next_week,
        );

        let mut index = WeeklyIndex::new();
        let stats = index.merge(&snapshot);

        assert_eq!(stats.newly_indexed, 3);
        assert_eq!(stats.weeks_touched, 2);
        assert_eq!(index.bucket(WeekKey::new(2022, 10)).unwrap().len(), 2);
        assert_eq!(index.bucket(WeekKey::new(2022, 11)).unwrap().len(), 1);
        assert!(index.bucket(WeekKey::new(2022, 12)).is_none());
        assert!(index.bucket(WeekKey::new(2021, 10)).is_none());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let snapshot = FeedSnapshot::new(vec![make_item("2022/1", monday())], monday());

        let mut index = WeeklyIndex::new();
        index.merge(&snapshot);
        let stats = index.merge(&snapshot);

        assert_eq!(stats.newly_indexed, 0);
        assert_eq!(index.bucket(WeekKey::new(2022, 10)).unwrap().len(), 1);
    }

    #[test]
    fn test_changed_item_is_appended_not_replaced() {
        let mut index = WeeklyIndex::new();
        let original = make_item("2022/1", monday());
        let mut revised = original.clone();
        revised.title = "Revised title".into();

        assert!(index.insert(WeekKey::new(2022, 10), &original));
        assert!(index.insert(WeekKey::new(2022, 10), &revised));

        let bucket = index.bucket(WeekKey::new(2022, 10)).unwrap();
        assert_eq!(bucket, &[original, revised]);
    }

    #[test]
    fn test_weeks_sorted() {
        let mut index = WeeklyIndex::new();
        let item = make_item("x", monday());
        index.insert(WeekKey::new(2023, 2), &item);
        index.insert(WeekKey::new(2022, 52), &item);
        index.insert(WeekKey::new(2022, 10), &item);

        let weeks: Vec<_> = index.weeks().collect();
        assert_eq!(
            weeks,
            vec![
                WeekKey::new(2022, 10),
                WeekKey::new(2022, 52),
                WeekKey::new(2023, 2)
            ]
        );
        assert_eq!(index.item_count(), 3);
    }
}
