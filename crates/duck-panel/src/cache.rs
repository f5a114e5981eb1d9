//! Snapshot cache — last known good value per feed.
//!
//! `set` always replaces the whole snapshot.  A failed poll never touches the
//! data; it only records the error so views can show it next to stale rows.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::feeds::{Collection, Item, Status, StatusKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Fresh,
    Stale,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub data: T,
    pub fetched_at: Instant,
}

#[derive(Debug)]
struct Entry<T> {
    snapshot: Option<Snapshot<T>>,
    last_error: Option<String>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            last_error: None,
        }
    }
}

#[derive(Debug)]
pub struct SnapshotStore<K, T> {
    entries: HashMap<K, Entry<T>>,
}

pub type CollectionCache = SnapshotStore<Collection, Vec<Item>>;
pub type StatusCache = SnapshotStore<StatusKind, Status>;

impl<K: Eq + Hash + Copy, T> SnapshotStore<K, T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Replace the snapshot for `key` and clear any recorded failure.
    pub fn set(&mut self, key: K, data: T, now: Instant) {
        let entry = self.entries.entry(key).or_default();
        entry.snapshot = Some(Snapshot {
            data,
            fetched_at: now,
        });
        entry.last_error = None;
    }

    /// `None` until the first successful fetch for `key`.
    pub fn get(&self, key: K) -> Option<&T> {
        self.snapshot(key).map(|s| &s.data)
    }

    pub fn snapshot(&self, key: K) -> Option<&Snapshot<T>> {
        self.entries.get(&key).and_then(|e| e.snapshot.as_ref())
    }

    /// Record a failed poll.  Data already held for `key` is left as is.
    pub fn mark_failed(&mut self, key: K, message: impl Into<String>) {
        self.entries.entry(key).or_default().last_error = Some(message.into());
    }

    pub fn last_error(&self, key: K) -> Option<&str> {
        self.entries.get(&key).and_then(|e| e.last_error.as_deref())
    }

    /// `None` when nothing has been fetched or failed yet.
    pub fn status(&self, key: K, now: Instant, stale_after: Duration) -> Option<FetchStatus> {
        let entry = self.entries.get(&key)?;
        if entry.last_error.is_some() {
            return Some(FetchStatus::Error);
        }
        let snapshot = entry.snapshot.as_ref()?;
        if now.saturating_duration_since(snapshot.fetched_at) > stale_after {
            Some(FetchStatus::Stale)
        } else {
            Some(FetchStatus::Fresh)
        }
    }
}

impl<K: Eq + Hash + Copy, T> Default for SnapshotStore<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Copy> SnapshotStore<K, Vec<Item>> {
    /// Items of `key` matching `predicate`, in cache order.  Pure; never
    /// fetches.
    pub fn filter<P>(&self, key: K, predicate: P) -> Option<Vec<&Item>>
    where
        P: Fn(&Item) -> bool,
    {
        self.get(key)
            .map(|items| items.iter().filter(|i| predicate(i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duck_proto::protocol::{Fact, Hunger, Memory};

    fn fact(key: &str) -> Item {
        Item::Fact(Fact {
            key: key.into(),
            value: "v".into(),
            topic: "family".into(),
            confidence: 0.7,
            ..Default::default()
        })
    }

    #[test]
    fn test_set_get_identity_for_every_collection() {
        let mut cache = CollectionCache::new();
        let now = Instant::now();
        for (i, c) in Collection::ALL.into_iter().enumerate() {
            let items: Vec<Item> = (0..i).map(|n| fact(&format!("k{}", n))).collect();
            cache.set(c, items.clone(), now);
            assert_eq!(cache.get(c), Some(&items));
        }
    }

    #[test]
    fn test_absent_before_first_fetch() {
        let mut cache = CollectionCache::new();
        assert!(cache.get(Collection::Facts).is_none());
        cache.mark_failed(Collection::Facts, "connection refused");
        assert!(cache.get(Collection::Facts).is_none());
        assert_eq!(cache.last_error(Collection::Facts), Some("connection refused"));
    }

    #[test]
    fn test_set_replaces_not_merges() {
        let mut cache = CollectionCache::new();
        let now = Instant::now();
        cache.set(Collection::Facts, vec![fact("a"), fact("b"), fact("c")], now);
        cache.set(Collection::Facts, vec![fact("b")], now);
        assert_eq!(cache.get(Collection::Facts), Some(&vec![fact("b")]));
    }

    #[test]
    fn test_failure_keeps_snapshot() {
        let mut cache = CollectionCache::new();
        let now = Instant::now();
        cache.set(Collection::Facts, vec![fact("a")], now);
        cache.mark_failed(Collection::Facts, "HTTP 500");
        assert_eq!(cache.get(Collection::Facts), Some(&vec![fact("a")]));
        assert_eq!(
            cache.status(Collection::Facts, now, Duration::from_secs(60)),
            Some(FetchStatus::Error)
        );

        cache.set(Collection::Facts, vec![fact("b")], now);
        assert_eq!(cache.last_error(Collection::Facts), None);
    }

    #[test]
    fn test_status_goes_stale() {
        let mut cache = StatusCache::new();
        let t0 = Instant::now();
        let stale_after = Duration::from_secs(60);
        assert_eq!(cache.status(StatusKind::Hunger, t0, stale_after), None);
        cache.set(StatusKind::Hunger, Status::Hunger(Hunger::default()), t0);
        assert_eq!(cache.status(StatusKind::Hunger, t0, stale_after), Some(FetchStatus::Fresh));
        assert_eq!(
            cache.status(StatusKind::Hunger, t0 + Duration::from_secs(61), stale_after),
            Some(FetchStatus::Stale)
        );
    }

    #[test]
    fn test_out_of_order_arrivals_stay_independent() {
        let mut cache = CollectionCache::new();
        let t0 = Instant::now();
        let memories = vec![Item::Memory(Memory {
            id: 7,
            text: "went fishing".into(),
            ..Default::default()
        })];
        // memories poll started first but lands after facts
        cache.set(Collection::Facts, vec![fact("a")], t0 + Duration::from_millis(5));
        cache.set(Collection::Memories, memories.clone(), t0 + Duration::from_millis(9));
        cache.set(Collection::Facts, vec![fact("z")], t0 + Duration::from_millis(12));
        assert_eq!(cache.get(Collection::Facts), Some(&vec![fact("z")]));
        assert_eq!(cache.get(Collection::Memories), Some(&memories));
    }

    #[test]
    fn test_filter_is_projection() {
        let mut cache = CollectionCache::new();
        cache.set(Collection::Facts, vec![fact("a"), fact("b")], Instant::now());
        let picked = cache
            .filter(Collection::Facts, |i| matches!(i, Item::Fact(f) if f.key == "b"))
            .unwrap();
        assert_eq!(picked, vec![&fact("b")]);
        assert!(cache.filter(Collection::Songs, |_| true).is_none());
        assert_eq!(cache.get(Collection::Facts).map(Vec::len), Some(2));
    }
}
