//! The group of indexes configured for one collection
//!
//! Indexes are kept in creation order (export preserves it). Adding a record
//! touches every index; if one rejects it, the indexes already touched are
//! rolled back so the set as a whole either fully reflects the record or not
//! at all.

use serde_json::Value;

use crate::error::StoreResult;
use crate::store::RecordId;

use super::index::{Index, IndexDef};

/// Insertion-ordered set of indexes, keyed by property path.
#[derive(Debug, Default)]
pub struct IndexSet {
    indexes: Vec<Index>,
}

impl IndexSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an index by property path.
    pub fn get(&self, property: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.property() == property)
    }

    /// Number of configured indexes
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Whether no indexes are configured
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Iterates indexes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Index> {
        self.indexes.iter()
    }

    /// Index definitions in creation order (for export)
    pub fn defs(&self) -> Vec<IndexDef> {
        self.indexes.iter().map(Index::def).collect()
    }

    /// Attaches a fully built index. The caller checks for duplicates.
    pub(crate) fn attach(&mut self, index: Index) {
        self.indexes.push(index);
    }

    /// Detaches and returns the index for a property, if configured.
    pub(crate) fn detach(&mut self, property: &str) -> Option<Index> {
        let position = self
            .indexes
            .iter()
            .position(|index| index.property() == property)?;
        Some(self.indexes.remove(position))
    }

    /// Drops every index.
    pub(crate) fn clear(&mut self) {
        self.indexes.clear();
    }

    /// Adds a record to every index.
    ///
    /// On failure, memberships already recorded in earlier indexes are
    /// removed again before the error propagates; the set ends unchanged.
    pub fn add_record(&mut self, record: &Value, id: RecordId) -> StoreResult<()> {
        for touched in 0..self.indexes.len() {
            if let Err(err) = self.indexes[touched].add_record(record, id) {
                for rolled_back in &mut self.indexes[..touched] {
                    rolled_back.remove_record(record, id);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Removes a record from every index (best-effort, never fails).
    pub fn remove_record(&mut self, record: &Value, id: RecordId) {
        for index in &mut self.indexes {
            index.remove_record(record, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_with(defs: &[(&str, bool, bool)]) -> IndexSet {
        let mut set = IndexSet::new();
        for (property, unique, required) in defs {
            set.attach(Index::new(*property, *unique, *required));
        }
        set
    }

    #[test]
    fn test_add_touches_every_index() {
        let mut set = set_with(&[("a", false, false), ("b", false, false)]);
        set.add_record(&json!({"a": 1, "b": "x"}), 0).unwrap();

        assert_eq!(set.get("a").unwrap().find_value(&json!(1)), Some([0].as_slice()));
        assert_eq!(
            set.get("b").unwrap().find_value(&json!("x")),
            Some([0].as_slice())
        );
    }

    #[test]
    fn test_failure_rolls_back_earlier_indexes() {
        let mut set = set_with(&[("a", false, false), ("b", true, true)]);
        set.add_record(&json!({"a": 1, "b": 1}), 0).unwrap();

        // Fails on b (duplicate); membership already added to a must vanish.
        let err = set.add_record(&json!({"a": 2, "b": 1}), 1).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_KEY");
        assert_eq!(set.get("a").unwrap().find_value(&json!(2)), None);

        // Fails on b (required missing) the same way.
        let err = set.add_record(&json!({"a": 3}), 2).unwrap_err();
        assert_eq!(err.code(), "REQUIRED_MISSING");
        assert_eq!(set.get("a").unwrap().find_value(&json!(3)), None);
    }

    #[test]
    fn test_defs_preserve_creation_order() {
        let set = set_with(&[("z", true, true), ("a", false, false)]);
        let defs = set.defs();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].property, "z");
        assert!(defs[0].unique);
        assert_eq!(defs[1].property, "a");
        assert!(!defs[1].unique);
    }

    #[test]
    fn test_detach() {
        let mut set = set_with(&[("a", false, false)]);
        assert!(set.detach("missing").is_none());
        assert!(set.detach("a").is_some());
        assert!(set.is_empty());
    }
}
