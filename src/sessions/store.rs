//! Ordered key → value store with a lock-releasing range scan.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use super::key::EncodedKey;

/// A sorted map guarded by a single reader/writer lock.
///
/// Mutations hold the write lock only for the structural change. Values are
/// handed out by clone, so callers are expected to store cheap handles such as
/// `Arc<T>`.
pub struct OrderedStore<V> {
    entries: Arc<RwLock<BTreeMap<EncodedKey, V>>>,
}

impl<V: Clone> OrderedStore<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn get(&self, key: &EncodedKey) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    /// Insert or overwrite. Returns the previous value, if any.
    pub fn set(&self, key: EncodedKey, value: V) -> Option<V> {
        self.entries.write().insert(key, value)
    }

    /// Insert only when `key` is vacant. Returns `false` if it was taken.
    ///
    /// The existence check and the insert happen under one write lock.
    pub fn insert_if_absent(&self, key: EncodedKey, value: V) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, value);
        true
    }

    pub fn delete(&self, key: &EncodedKey) -> Option<V> {
        self.entries.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Lazily walk `lo..=hi` in ascending key order.
    pub fn scan(&self, lo: EncodedKey, hi: EncodedKey) -> ScanIter<V> {
        self.scan_range(Bound::Included(lo), Bound::Included(hi))
    }

    /// Lazily walk an arbitrary key range in ascending order.
    ///
    /// See [`ScanIter`] for the consistency guarantees.
    pub fn scan_range(&self, lo: Bound<EncodedKey>, hi: Bound<EncodedKey>) -> ScanIter<V> {
        ScanIter {
            entries: Arc::clone(&self.entries),
            next_lo: lo,
            hi,
            done: false,
        }
    }
}

impl<V: Clone> Default for OrderedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull-based cursor over a key range of an [`OrderedStore`].
///
/// Every call to `next` takes the read lock, looks up the first entry after
/// the last key it returned, clones it and releases the lock before handing
/// the entry out. No lock is held between calls, so the consumer may call back
/// into the store (including writes) and dropping the iterator early needs no
/// cleanup. The view is per step: entries inserted or deleted ahead of the
/// cursor while it is paused may or may not be observed.
pub struct ScanIter<V> {
    entries: Arc<RwLock<BTreeMap<EncodedKey, V>>>,
    next_lo: Bound<EncodedKey>,
    hi: Bound<EncodedKey>,
    done: bool,
}

impl<V: Clone> Iterator for ScanIter<V> {
    type Item = (EncodedKey, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || range_is_empty(&self.next_lo, &self.hi) {
            self.done = true;
            return None;
        }

        let found = {
            let entries = self.entries.read();
            entries
                .range((self.next_lo.clone(), self.hi.clone()))
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
        };

        match found {
            Some((key, value)) => {
                self.next_lo = Bound::Excluded(key.clone());
                Some((key, value))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

// BTreeMap::range panics on an inverted or doubly-excluded empty range.
fn range_is_empty(lo: &Bound<EncodedKey>, hi: &Bound<EncodedKey>) -> bool {
    match (lo, hi) {
        (Bound::Included(l), Bound::Included(h)) => l > h,
        (Bound::Included(l) | Bound::Excluded(l), Bound::Excluded(h))
        | (Bound::Excluded(l), Bound::Included(h)) => l >= h,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> EncodedKey {
        EncodedKey::from_bytes(s.as_bytes().to_vec())
    }

    fn store_with(keys: &[&str]) -> OrderedStore<u32> {
        let store = OrderedStore::new();
        for (i, k) in keys.iter().enumerate() {
            store.set(key(k), i as u32);
        }
        store
    }

    #[test]
    fn get_set_delete() {
        let store = OrderedStore::new();
        assert_eq!(store.get(&key("a")), None);
        assert_eq!(store.set(key("a"), 1), None);
        assert_eq!(store.set(key("a"), 2), Some(1));
        assert_eq!(store.get(&key("a")), Some(2));
        assert_eq!(store.delete(&key("a")), Some(2));
        assert_eq!(store.delete(&key("a")), None);
        assert!(store.is_empty());
    }

    #[test]
    fn insert_if_absent_keeps_first_value() {
        let store = OrderedStore::new();
        assert!(store.insert_if_absent(key("a"), 1));
        assert!(!store.insert_if_absent(key("a"), 2));
        assert_eq!(store.get(&key("a")), Some(1));
    }

    #[test]
    fn scan_is_inclusive_and_ordered() {
        let store = store_with(&["d", "b", "a", "c", "e"]);
        let keys: Vec<_> = store.scan(key("b"), key("d")).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![key("b"), key("c"), key("d")]);
    }

    #[test]
    fn scan_with_inverted_range_is_empty() {
        let store = store_with(&["a", "b"]);
        assert_eq!(store.scan(key("b"), key("a")).count(), 0);
        assert_eq!(
            store
                .scan_range(Bound::Excluded(key("a")), Bound::Excluded(key("a")))
                .count(),
            0
        );
    }

    #[test]
    fn consumer_can_write_during_scan() {
        let store = store_with(&["a", "b", "c"]);
        let mut seen = Vec::new();
        for (k, v) in store.scan(key("a"), key("z")) {
            // Would deadlock if the scan held the read lock across yields.
            store.set(k.clone(), v + 10);
            seen.push(k);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(store.get(&key("b")), Some(11));
    }

    #[test]
    fn scan_observes_deletes_ahead_of_cursor() {
        let store = store_with(&["a", "b", "c"]);
        let mut iter = store.scan(key("a"), key("z"));
        assert_eq!(iter.next().map(|(k, _)| k), Some(key("a")));
        store.delete(&key("b"));
        assert_eq!(iter.next().map(|(k, _)| k), Some(key("c")));
        assert!(iter.next().is_none());
    }

    #[test]
    fn early_break_releases_lock() {
        let store = store_with(&["a", "b", "c"]);
        if let Some((k, _)) = store.scan(key("a"), key("z")).next() {
            assert_eq!(k, key("a"));
        }
        store.set(key("d"), 4);
        assert_eq!(store.len(), 4);
    }
}
