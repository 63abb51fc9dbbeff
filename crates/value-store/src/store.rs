//! The value store: a per-check map from key to the last recorded sample.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One persisted sample point.
///
/// Counters remember the raw reading so the next run can compute a delta;
/// averages remember the running average itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueStoreEntry {
    Counter { timestamp: f64, value: f64 },
    Average { timestamp: f64, average: f64 },
}

impl ValueStoreEntry {
    pub fn counter(timestamp: f64, value: f64) -> Self {
        Self::Counter { timestamp, value }
    }

    pub fn average(timestamp: f64, average: f64) -> Self {
        Self::Average { timestamp, average }
    }

    /// Time the sample was taken, in seconds since the epoch.
    pub fn timestamp(&self) -> f64 {
        match *self {
            Self::Counter { timestamp, .. } | Self::Average { timestamp, .. } => timestamp,
        }
    }

    /// Whether every number in the entry can be persisted.
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Counter { timestamp, value } => timestamp.is_finite() && value.is_finite(),
            Self::Average { timestamp, average } => timestamp.is_finite() && average.is_finite(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Counter { .. } => "counter",
            Self::Average { .. } => "average",
        }
    }
}

/// Key-value cache carrying state between successive evaluations of one check.
///
/// A store is owned by whoever runs the check and lent to the check function
/// as `&mut ValueStore` for a single evaluation. It remembers whether it was
/// changed since it was loaded so unchanged stores need not be rewritten.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueStore {
    entries: BTreeMap<String, ValueStoreEntry>,
    #[serde(skip)]
    modified: bool,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ValueStoreEntry> {
        self.entries.get(key)
    }

    /// Insert or overwrite the entry for `key`, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        entry: ValueStoreEntry,
    ) -> Option<ValueStoreEntry> {
        self.modified = true;
        self.entries.insert(key.into(), entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<ValueStoreEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Remove every key starting with `prefix`, e.g. all metrics of one
    /// vanished sub-item. Returns how many entries were dropped.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.modified = true;
        }
        removed
    }

    /// Drop entries holding NaN or infinities, which have no JSON
    /// representation. Returns the dropped keys.
    pub fn remove_non_finite(&mut self) -> Vec<String> {
        let dropped: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_finite())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &dropped {
            self.entries.remove(key);
        }
        if !dropped.is_empty() {
            self.modified = true;
        }
        dropped
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.modified = true;
        }
        self.entries.clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ValueStoreEntry> {
        self.entries.iter()
    }

    /// Whether anything was written since the store was created or last
    /// marked clean.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Forget pending modifications, typically right after persisting.
    pub fn mark_clean(&mut self) {
        self.modified = false;
    }

    /// Previous counter sample for `key`. An average stored under the same
    /// key is treated as absent.
    pub(crate) fn counter_sample(&self, key: &str) -> Option<(f64, f64)> {
        match self.entries.get(key)? {
            ValueStoreEntry::Counter { timestamp, value } => Some((*timestamp, *value)),
            other => {
                warn!(key = %key, found = other.kind(), "Value store key does not hold a counter, reinitializing");
                None
            }
        }
    }

    /// Previous average for `key`. A counter stored under the same key is
    /// treated as absent.
    pub(crate) fn average_sample(&self, key: &str) -> Option<(f64, f64)> {
        match self.entries.get(key)? {
            ValueStoreEntry::Average { timestamp, average } => Some((*timestamp, *average)),
            other => {
                warn!(key = %key, found = other.kind(), "Value store key does not hold an average, reinitializing");
                None
            }
        }
    }
}

impl<'a> IntoIterator for &'a ValueStore {
    type Item = (&'a String, &'a ValueStoreEntry);
    type IntoIter = btree_map::Iter<'a, String, ValueStoreEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty_and_clean() {
        let store = ValueStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(!store.is_modified());
    }

    #[test]
    fn test_insert_overwrites_and_marks_modified() {
        let mut store = ValueStore::new();
        assert!(store.insert("ctxt", ValueStoreEntry::counter(1.0, 2.0)).is_none());
        let previous = store.insert("ctxt", ValueStoreEntry::counter(3.0, 4.0));

        assert_eq!(previous, Some(ValueStoreEntry::counter(1.0, 2.0)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("ctxt").map(ValueStoreEntry::timestamp), Some(3.0));
        assert!(store.is_modified());

        store.mark_clean();
        assert!(!store.is_modified());
    }

    #[test]
    fn test_remove_missing_key_keeps_store_clean() {
        let mut store = ValueStore::new();
        assert!(store.remove("missing").is_none());
        store.clear();
        assert!(!store.is_modified());
    }

    #[test]
    fn test_remove_prefix_only_touches_matching_keys() {
        let mut store = ValueStore::new();
        store.insert("5.running_since", ValueStoreEntry::counter(1.0, 1.0));
        store.insert("5.bytes", ValueStoreEntry::counter(1.0, 1.0));
        store.insert("6.running_since", ValueStoreEntry::counter(1.0, 1.0));

        assert_eq!(store.remove_prefix("5."), 2);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["6.running_since"]);
        assert_eq!(store.remove_prefix("7."), 0);
    }

    #[test]
    fn test_remove_non_finite() {
        let mut store = ValueStore::new();
        store.insert("a", ValueStoreEntry::average(600.0, f64::NEG_INFINITY));
        store.insert("b", ValueStoreEntry::counter(0.0, 1.0));
        store.insert("c", ValueStoreEntry::counter(f64::NAN, 1.0));
        store.mark_clean();

        assert_eq!(store.remove_non_finite(), vec!["a", "c"]);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["b"]);
        assert!(store.is_modified());
        assert!(store.remove_non_finite().is_empty());
    }

    #[test]
    fn test_kind_mismatch_reads_as_absent() {
        let mut store = ValueStore::new();
        store.insert("k", ValueStoreEntry::average(10.0, 3.0));
        assert!(store.counter_sample("k").is_none());
        assert_eq!(store.average_sample("k"), Some((10.0, 3.0)));

        store.insert("k", ValueStoreEntry::counter(10.0, 3.0));
        assert!(store.average_sample("k").is_none());
        assert_eq!(store.counter_sample("k"), Some((10.0, 3.0)));
    }

    #[test]
    fn test_serialized_shape() {
        let mut store = ValueStore::new();
        store.insert("ceph_status.epoch.rate", ValueStoreEntry::counter(100.0, 50.0));
        store.insert("ceph_status.epoch.avg", ValueStoreEntry::average(100.0, 2.5));

        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ceph_status.epoch.avg": { "timestamp": 100.0, "average": 2.5 },
                "ceph_status.epoch.rate": { "timestamp": 100.0, "value": 50.0 },
            })
        );

        let restored: ValueStore = serde_json::from_value(json).unwrap();
        assert_eq!(
            restored.get("ceph_status.epoch.avg"),
            Some(&ValueStoreEntry::average(100.0, 2.5))
        );
        assert!(!restored.is_modified());
    }
}
