//! Whole-collection export and rebuild
//!
//! A snapshot is a serializable picture of a collection: its primary key,
//! its index definitions in creation order, and its records. Rebuilding
//! replays the snapshot through the normal insert path, so identities are
//! reassigned and every index is rebuilt from scratch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::Collection;
use crate::error::StoreResult;
use crate::events::MutationEvent;
use crate::index::{Index, IndexDef};
use crate::store::ID_FIELD;

/// Serializable picture of a collection's configuration and contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Primary key property, if the collection has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Index definitions in creation order
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Stored records, identities included
    #[serde(default)]
    pub records: Vec<Value>,
}

impl Collection {
    /// Exports the collection's configuration and records.
    pub fn export(&self) -> Snapshot {
        Snapshot {
            primary_key: self.primary_key.clone(),
            indexes: self.indexes.defs(),
            records: self.store.iter().map(|(_, record)| record.clone()).collect(),
        }
    }

    /// Replaces the collection's contents with a snapshot's.
    ///
    /// Existing records and indexes are dropped and the identity counter
    /// resets. Indexes are recreated empty, then the snapshot's records are
    /// re-inserted with stored identities stripped, so each record earns a
    /// fresh identity and re-enters every index. Records that no longer
    /// satisfy an index land in the returned event's `failed` list.
    pub fn rebuild(&mut self, snapshot: Snapshot) -> StoreResult<MutationEvent> {
        self.store.clear();
        self.indexes.clear();
        self.primary_key = snapshot.primary_key;
        for def in snapshot.indexes {
            self.indexes
                .attach(Index::new(def.property, def.unique, def.required));
        }

        let records = snapshot
            .records
            .into_iter()
            .map(|mut record| {
                if let Some(fields) = record.as_object_mut() {
                    fields.remove(ID_FIELD);
                }
                record
            })
            .collect();
        Ok(self.insert(records))
    }
}
