use ahash::RandomState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bumped whenever the persisted snapshot layout changes. Older files are discarded.
pub const SCHEMA_VERSION: u32 = 3;

/// Derived, core-owned record for one media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedItem {
    pub id: String,
    pub year: i32,
    /// Estimated size; the expensive part of indexing.
    pub byte_size: u64,
    /// max(created, modified) when this item was last derived.
    pub changed_at: DateTime<Utc>,
}

pub(crate) type ItemMap = HashMap<String, IndexedItem, RandomState>;

/// Immutable point-in-time index of the library.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    schema_version: u32,
    indexed_at: DateTime<Utc>,
    items: ItemMap,
}

impl IndexSnapshot {
    /// Build a snapshot at the current schema version. Later duplicates of an id win.
    pub fn new(indexed_at: DateTime<Utc>, items: impl IntoIterator<Item = IndexedItem>) -> Self {
        Self::with_version(SCHEMA_VERSION, indexed_at, items)
    }

    pub(crate) fn with_version(
        schema_version: u32,
        indexed_at: DateTime<Utc>,
        items: impl IntoIterator<Item = IndexedItem>,
    ) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        Self {
            schema_version,
            indexed_at,
            items,
        }
    }

    pub fn empty(indexed_at: DateTime<Utc>) -> Self {
        Self::new(indexed_at, Vec::new())
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn indexed_at(&self) -> DateTime<Utc> {
        self.indexed_at
    }

    pub fn get(&self, id: &str) -> Option<&IndexedItem> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &IndexedItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of byte sizes for `ids`; ids not in the snapshot count as 0.
    pub fn total_bytes_of<S: AsRef<str>>(&self, ids: &[S]) -> u64 {
        ids.iter()
            .filter_map(|id| self.items.get(id.as_ref()))
            .map(|item| item.byte_size)
            .sum()
    }

    pub(crate) fn item_map(&self) -> &ItemMap {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, year: i32, size: u64) -> IndexedItem {
        IndexedItem {
            id: id.to_string(),
            year,
            byte_size: size,
            changed_at: Utc.with_ymd_and_hms(year, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let snapshot = IndexSnapshot::new(Utc::now(), vec![item("a", 2020, 1), item("a", 2021, 2)]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("a").unwrap().byte_size, 2);
        assert_eq!(snapshot.schema_version(), SCHEMA_VERSION);
    }

    #[test]
    fn test_total_bytes_ignores_unknown_ids() {
        let snapshot = IndexSnapshot::new(Utc::now(), vec![item("a", 2020, 10), item("b", 2021, 5)]);
        let ids = vec!["a".to_string(), "b".to_string(), "gone".to_string()];
        assert_eq!(snapshot.total_bytes_of(&ids), 15);
    }
}
