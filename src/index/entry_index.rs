use crate::index::entry::{Entry, EntryType};
use crate::index::sort::sort_by_name;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Deduplicated entries collected over one crawl
///
/// The index is append-only. Root entries are dropped on `add`, and identical
/// entries collapse to one no matter how many pages produce them.
#[derive(Debug, Default, Clone)]
pub struct EntryIndex {
    entries: BTreeSet<Entry>,
}

/// Serialized form of an index: sorted entries and per-type counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSnapshot {
    pub entries: Vec<Entry>,
    pub types: Vec<EntryType>,
}

impl EntryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, returning true if the index grew
    pub fn add(&mut self, entry: Entry) -> bool {
        if entry.is_root() {
            tracing::trace!("Skipping root entry {}", entry.name());
            return false;
        }
        self.entries.insert(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &Entry) -> bool {
        self.entries.contains(entry)
    }

    /// Builds the sorted entry and type lists
    ///
    /// Entries are ordered by name with [`compare_names`](crate::index::compare_names);
    /// entries sharing a name keep `(name, path, type)` order. Types are
    /// counted over the sorted entries, then sorted by name the same way.
    pub fn snapshot(&self) -> IndexSnapshot {
        let entries = sort_by_name(self.entries.iter().cloned().collect(), |e: &Entry| e.name());

        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for entry in &entries {
            match positions.get(entry.entry_type()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    positions.insert(entry.entry_type().to_string(), counts.len());
                    counts.push((entry.entry_type().to_string(), 1));
                }
            }
        }

        let types = sort_by_name(
            counts
                .into_iter()
                .map(|(name, count)| EntryType::new(name, count))
                .collect(),
            |t: &EntryType| t.name.as_str(),
        );

        IndexSnapshot { entries, types }
    }

    /// Serializes the snapshot as `{"entries": [...], "types": [...]}`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }
}

impl Extend<Entry> for EntryIndex {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        for entry in iter {
            self.add(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, path: &str, entry_type: &str) -> Entry {
        Entry::new(name, path, entry_type).unwrap()
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = EntryIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_duplicate_add_does_not_grow() {
        let mut index = EntryIndex::new();
        assert!(index.add(entry("Vec", "vec", "Struct")));
        assert!(!index.add(entry(" Vec ", "vec", "Struct")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_same_name_different_path_is_distinct() {
        let mut index = EntryIndex::new();
        index.add(entry("new", "vec#new", "Method"));
        index.add(entry("new", "string#new", "Method"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_root_entries_never_indexed() {
        let mut index = EntryIndex::new();
        assert!(!index.add(entry("Home", "index", "Guide")));
        index.extend(vec![entry("Home", "index", "Guide"), entry("Intro", "intro", "Guide")]);
        assert_eq!(index.len(), 1);
        assert!(!index.contains(&entry("Home", "index", "Guide")));
    }

    #[test]
    fn test_type_aggregation() {
        let mut index = EntryIndex::new();
        index.extend(vec![
            entry("a", "p1", "Module"),
            entry("b", "p2", "Module"),
            entry("c", "p3", "Function"),
        ]);

        let snapshot = index.snapshot();
        assert_eq!(
            snapshot.types,
            vec![EntryType::new("Function", 1), EntryType::new("Module", 2)]
        );
    }

    #[test]
    fn test_types_are_case_sensitive() {
        let mut index = EntryIndex::new();
        index.extend(vec![entry("a", "p1", "module"), entry("b", "p2", "Module")]);
        assert_eq!(index.snapshot().types.len(), 2);
    }

    #[test]
    fn test_entries_sorted_by_name() {
        let mut index = EntryIndex::new();
        index.extend(vec![
            entry("zlib", "zlib", "Crate"),
            entry("1.2.0", "v1", "Release"),
            entry("abc", "abc", "Crate"),
            entry("2.0.0-beta", "v2", "Release"),
        ]);

        let names: Vec<String> = index
            .snapshot()
            .entries
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["abc", "zlib", "1.2.0", "2.0.0-beta"]);
    }

    #[test]
    fn test_snapshot_is_independent_of_insertion_order() {
        let items = vec![
            entry("new", "vec#new", "Method"),
            entry("New", "string#new", "Method"),
            entry("push", "vec#push", "Method"),
        ];

        let mut forward = EntryIndex::new();
        forward.extend(items.clone());
        let mut backward = EntryIndex::new();
        backward.extend(items.into_iter().rev());

        assert_eq!(forward.snapshot(), backward.snapshot());
    }

    #[test]
    fn test_to_json_shape() {
        let mut index = EntryIndex::new();
        index.add(entry("Vec", "vec", "Struct"));

        let json: serde_json::Value = serde_json::from_str(&index.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "entries": [{"name": "Vec", "path": "vec", "type": "Struct"}],
                "types": [{"name": "Struct", "count": 1, "slug": "struct"}]
            })
        );
    }
}
