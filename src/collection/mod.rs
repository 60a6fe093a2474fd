//! The collection: records, indexes and events behind one surface
//!
//! A `Collection` owns a record store, the index set kept consistent with
//! it, and the event hub mutations report to. Reads compile the condition,
//! plan against the indexes and return cloned records; mutations live in the
//! `mutate` submodule.

mod mutate;

pub use mutate::Upserted;

use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::events::{DispatchMode, EventHub, EventKind, MutationEvent};
use crate::index::{Index, IndexSet};
use crate::planner;
use crate::query;
use crate::store::{RecordId, RecordStore};

/// An in-process collection of schemaless records.
#[derive(Debug, Default)]
pub struct Collection {
    pub(crate) store: RecordStore,
    pub(crate) indexes: IndexSet,
    pub(crate) events: EventHub,
    pub(crate) primary_key: Option<String>,
}

impl Collection {
    /// Creates an empty collection with no primary key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection keyed by a property.
    ///
    /// The primary key gets a unique, required index and becomes the upsert
    /// lookup property for records without an identity.
    pub fn with_primary_key(property: impl Into<String>) -> Self {
        let property = property.into();
        let mut collection = Self::new();
        collection.indexes.attach(Index::new(property.clone(), true, true));
        collection.primary_key = Some(property);
        collection
    }

    /// Sets the event dispatch mode at construction.
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.events.set_mode(mode);
        self
    }

    /// Primary key property, if the collection has one
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Read-only view of the configured indexes
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// Switches event dispatch mode.
    pub fn set_dispatch_mode(&mut self, mode: DispatchMode) {
        self.events.set_mode(mode);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the collection holds no records
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Creates an index over a property path and backfills it.
    ///
    /// Every stored record enters the new index before it becomes visible;
    /// if any record violates the index's constraints the index is discarded
    /// and the collection is unchanged.
    pub fn add_index(&mut self, property: &str, unique: bool, required: bool) -> StoreResult<()> {
        if self.indexes.get(property).is_some() {
            return Err(StoreError::IndexAlreadyExists {
                property: property.to_string(),
            });
        }
        let mut index = Index::new(property, unique, required);
        for (id, record) in self.store.iter() {
            index.add_record(record, id)?;
        }
        log::debug!(
            "index on '{}' created with {} partition(s)",
            property,
            index.partitions()
        );
        self.indexes.attach(index);
        Ok(())
    }

    /// Drops the index over a property path.
    pub fn remove_index(&mut self, property: &str) -> StoreResult<()> {
        self.indexes
            .detach(property)
            .map(|_| ())
            .ok_or_else(|| StoreError::IndexNotFound {
                property: property.to_string(),
            })
    }

    /// Returns every record matching a condition, cloned, in plan order.
    pub fn find(&self, condition: &Value) -> StoreResult<Vec<Value>> {
        let triples = query::compile_query(condition)?;
        let ids = planner::execute(&triples, &self.indexes, &self.store);
        Ok(self.clone_records(&ids))
    }

    /// Returns the first record matching a condition, if any.
    pub fn find_one(&self, condition: &Value) -> StoreResult<Option<Value>> {
        let triples = query::compile_query(condition)?;
        let ids = planner::execute(&triples, &self.indexes, &self.store);
        Ok(ids.first().and_then(|id| self.store.get(*id)).cloned())
    }

    /// Counts the records matching a condition.
    ///
    /// An empty condition is answered from the store size without a scan.
    pub fn count(&self, condition: &Value) -> StoreResult<usize> {
        let triples = query::compile_query(condition)?;
        if triples.is_empty() {
            return Ok(self.store.len());
        }
        Ok(planner::execute(&triples, &self.indexes, &self.store).len())
    }

    /// Whether any record matches a condition
    pub fn exists(&self, condition: &Value) -> StoreResult<bool> {
        Ok(self.find_one(condition)?.is_some())
    }

    /// Registers an event handler.
    pub fn on(&mut self, kind: EventKind, callback: impl FnMut(&MutationEvent) + 'static) {
        self.events.on(kind, callback);
    }

    /// Removes every handler registered for an event kind.
    pub fn off(&mut self, kind: EventKind) {
        self.events.off(kind);
    }

    /// Dispatches queued events (deferred mode); returns how many ran.
    pub fn drain_pending(&mut self) -> usize {
        self.events.drain_pending()
    }

    fn clone_records(&self, ids: &[RecordId]) -> Vec<Value> {
        ids.iter()
            .filter_map(|id| self.store.get(*id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> Collection {
        let mut collection = Collection::new();
        collection.insert(vec![
            json!({"name": "ada", "age": 36, "tags": ["math"]}),
            json!({"name": "grace", "age": 45, "tags": ["navy", "math"]}),
            json!({"name": "alan", "age": 41, "tags": []}),
        ]);
        collection
    }

    #[test]
    fn test_find_and_find_one() {
        let collection = seeded();
        let mathy = collection
            .find(&json!({"tags": {"$contains": "math"}}))
            .unwrap();
        assert_eq!(mathy.len(), 2);

        let one = collection.find_one(&json!({"name": "alan"})).unwrap().unwrap();
        assert_eq!(one["age"], json!(41));
        assert!(collection.find_one(&json!({"name": "x"})).unwrap().is_none());
    }

    #[test]
    fn test_count_and_exists() {
        let collection = seeded();
        assert_eq!(collection.count(&json!({})).unwrap(), 3);
        assert_eq!(collection.count(&json!({"age": {"$gt": 40}})).unwrap(), 2);
        assert!(collection.exists(&json!({"name": "ada"})).unwrap());
        assert!(!collection.exists(&json!({"name": "x"})).unwrap());
    }

    #[test]
    fn test_find_rejects_non_object_condition() {
        let collection = seeded();
        let err = collection.find(&json!([1])).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_add_index_backfills_existing_records() {
        let mut collection = seeded();
        collection.add_index("name", true, true).unwrap();
        let index = collection.indexes.get("name").unwrap();
        assert_eq!(index.partitions(), 3);
    }

    #[test]
    fn test_add_index_discarded_when_backfill_fails() {
        let mut collection = Collection::new();
        collection.insert(vec![json!({"k": 1}), json!({"k": 1})]);
        let err = collection.add_index("k", true, false).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_KEY");
        assert!(collection.indexes.get("k").is_none());
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let mut collection = Collection::new();
        collection.add_index("a", false, false).unwrap();
        let err = collection.add_index("a", true, false).unwrap_err();
        assert_eq!(err.code(), "INDEX_ALREADY_EXISTS");
    }

    #[test]
    fn test_remove_index() {
        let mut collection = Collection::new();
        collection.add_index("a", false, false).unwrap();
        collection.remove_index("a").unwrap();
        let err = collection.remove_index("a").unwrap_err();
        assert_eq!(err.code(), "INDEX_NOT_FOUND");
    }

    #[test]
    fn test_primary_key_index_is_unique_and_required() {
        let collection = Collection::with_primary_key("email");
        let index = collection.indexes.get("email").unwrap();
        assert!(index.unique());
        assert!(index.required());
        assert_eq!(collection.primary_key(), Some("email"));
    }
}
