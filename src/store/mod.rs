//! Primary record storage
//!
//! The store maps each record's identity to the record itself. Identities
//! come from a monotonic counter, are injected into the record under the
//! reserved `_id` field at insertion, and are never reused within a store's
//! lifetime — a failed insert still consumes its identity.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// A stored item: a schemaless field map (`Value::Object`)
pub type Record = Value;

/// Collection-unique record identity
pub type RecordId = u64;

/// Reserved field holding a record's identity
pub const ID_FIELD: &str = "_id";

/// Identity-ordered primary record map.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: BTreeMap<RecordId, Record>,
    next_id: RecordId,
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a fresh identity and injects it into the record.
    ///
    /// The record must be an object and must not carry a caller-supplied
    /// `_id`. The identity counter advances even if the surrounding insert
    /// later fails, so identities stay pairwise distinct.
    pub fn assign_identity(&mut self, record: &mut Record) -> StoreResult<RecordId> {
        let fields = record
            .as_object_mut()
            .ok_or_else(|| StoreError::invalid_argument("record must be an object"))?;
        if fields.contains_key(ID_FIELD) {
            return Err(StoreError::invalid_argument(
                "records cannot carry a caller-supplied _id",
            ));
        }
        let id = self.next_id;
        self.next_id += 1;
        fields.insert(ID_FIELD.to_string(), Value::from(id));
        Ok(id)
    }

    /// Stores a record under an identity, replacing any previous entry.
    pub fn put(&mut self, id: RecordId, record: Record) {
        self.records.insert(id, record);
    }

    /// Looks up a record by identity.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }

    /// Looks up a record by identity for in-place mutation.
    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.records.get_mut(&id)
    }

    /// Removes and returns a record.
    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        self.records.remove(&id)
    }

    /// Whether an identity refers to a live record
    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates live records in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Drops every record and resets the identity counter.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_id = 0;
    }
}
