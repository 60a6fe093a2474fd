//! Per-property secondary index
//!
//! Maps a property path's resolved value to the set of referencing record
//! ids. Ids in a bucket are kept sorted ascending. A list-valued property
//! indexes the record once per element. `partitions()` — the distinct
//! bucket-key count — is the planner's selectivity signal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::path;
use crate::store::RecordId;

use super::key::ValueKey;

/// The persisted shape of an index: property path plus constraint flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Property path the index covers
    pub property: String,
    /// At most one record per bucket
    #[serde(default)]
    pub unique: bool,
    /// Every record must resolve a value for this path
    #[serde(default)]
    pub required: bool,
}

/// A single-property bucket index.
#[derive(Debug)]
pub struct Index {
    property: String,
    unique: bool,
    required: bool,
    buckets: BTreeMap<ValueKey, Vec<RecordId>>,
}

impl Index {
    /// Creates an empty index.
    pub fn new(property: impl Into<String>, unique: bool, required: bool) -> Self {
        Self {
            property: property.into(),
            unique,
            required,
            buckets: BTreeMap::new(),
        }
    }

    /// Property path this index covers
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Whether buckets hold at most one record
    pub fn unique(&self) -> bool {
        self.unique
    }

    /// Whether every record must resolve a value
    pub fn required(&self) -> bool {
        self.required
    }

    /// Distinct bucket-key count; approximates selectivity.
    ///
    /// An all-same-value index has 1 partition; a unique index has as many
    /// partitions as records.
    pub fn partitions(&self) -> usize {
        self.buckets.len()
    }

    /// The index definition (for export)
    pub fn def(&self) -> IndexDef {
        IndexDef {
            property: self.property.clone(),
            unique: self.unique,
            required: self.required,
        }
    }

    /// Records the memberships for one record.
    ///
    /// An unresolved path is an error when the property is required and a
    /// no-op otherwise. A list value adds one membership per element; if any
    /// element fails, the memberships already added for this record are
    /// rolled back before the error propagates.
    pub fn add_record(&mut self, record: &Value, id: RecordId) -> StoreResult<()> {
        let Some(value) = path::resolve(record, &self.property) else {
            if self.required {
                return Err(StoreError::required_missing(self.property.clone()));
            }
            return Ok(());
        };
        match value {
            Value::Array(elements) => {
                for (added, element) in elements.iter().enumerate() {
                    if let Err(err) = self.add_key(ValueKey::from_value(element), id) {
                        for rolled_back in &elements[..added] {
                            self.remove_key(&ValueKey::from_value(rolled_back), id);
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
            scalar => self.add_key(ValueKey::from_value(scalar), id),
        }
    }

    /// Removes the memberships for one record.
    ///
    /// Mirrors `add_record`; removing a membership that does not exist is a
    /// silent no-op, so this is safe to call during best-effort cleanup.
    pub fn remove_record(&mut self, record: &Value, id: RecordId) {
        let Some(value) = path::resolve(record, &self.property) else {
            return;
        };
        match value {
            Value::Array(elements) => {
                for element in elements {
                    self.remove_key(&ValueKey::from_value(element), id);
                }
            }
            scalar => self.remove_key(&ValueKey::from_value(scalar), id),
        }
    }

    /// Looks up the bucket for a key.
    pub fn find(&self, key: &ValueKey) -> Option<&[RecordId]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Looks up the bucket for a raw value.
    pub fn find_value(&self, value: &Value) -> Option<&[RecordId]> {
        self.find(&ValueKey::from_value(value))
    }

    fn add_key(&mut self, key: ValueKey, id: RecordId) -> StoreResult<()> {
        if self.unique {
            if let Some(bucket) = self.buckets.get(&key) {
                if !bucket.is_empty() {
                    return Err(StoreError::duplicate_key(self.property.clone()));
                }
            }
        }
        let bucket = self.buckets.entry(key).or_default();
        if let Err(pos) = bucket.binary_search(&id) {
            bucket.insert(pos, id);
        }
        Ok(())
    }

    fn remove_key(&mut self, key: &ValueKey, id: RecordId) {
        if let Some(bucket) = self.buckets.get_mut(key) {
            if let Ok(pos) = bucket.binary_search(&id) {
                bucket.remove(pos);
            }
            if bucket.is_empty() {
                self.buckets.remove(key);
            }
        }
    }
}
