//! Mutation engine
//!
//! Inserts, updates, upserts and deletes. Mutations are atomic per record:
//! a record either lands fully in the store and every index, or is reported
//! in the event's `failed` list with the collection left as it was for that
//! record. An update removes the record's index memberships, applies the
//! changeset in place, and re-indexes the result; if re-indexing fails the
//! pre-update record is restored.

use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::events::{MutationEvent, Operation};
use crate::path;
use crate::planner;
use crate::query::{self, ChangeTriple};
use crate::store::{RecordId, ID_FIELD};

use super::Collection;

/// How an upsert resolved one record
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted {
    /// No existing record matched; the record was inserted.
    Inserted(Value),
    /// An existing record matched and was overwritten field by field.
    Updated(Value),
}

impl Collection {
    /// Inserts records, assigning each a fresh identity.
    ///
    /// Records are processed independently: one record's failure (non-object
    /// shape, caller-supplied identity, index constraint violation) lands it
    /// in the event's `failed` list and does not affect the others.
    pub fn insert(&mut self, records: Vec<Value>) -> MutationEvent {
        let mut event = MutationEvent::new(Operation::Insert);
        for record in records {
            match self.insert_inner(record) {
                Ok(inserted) => event.inserted.push(inserted),
                Err((failed, err)) => {
                    log::warn!("insert rejected a record: {err}");
                    event.failed.push(failed);
                }
            }
        }
        self.events.publish(event.clone());
        event
    }

    /// Inserts one record, returning it with its identity assigned.
    pub fn insert_one(&mut self, record: Value) -> StoreResult<Value> {
        let mut event = MutationEvent::new(Operation::Insert);
        let outcome = self.insert_inner(record);
        match outcome {
            Ok(inserted) => {
                event.inserted.push(inserted.clone());
                self.events.publish(event);
                Ok(inserted)
            }
            Err((failed, err)) => {
                event.failed.push(failed);
                self.events.publish(event);
                Err(err)
            }
        }
    }

    /// Applies a changeset to every record matching a condition.
    ///
    /// Records whose post-change shape violates an index are restored to
    /// their pre-update shape and reported in `failed`; the rest land in
    /// `updated`. Compilation errors abort before any record is touched.
    pub fn update(&mut self, condition: &Value, changes: &Value) -> StoreResult<MutationEvent> {
        let change_triples = query::compile_changes(changes)?;
        let query_triples = query::compile_query(condition)?;
        let ids = planner::execute(&query_triples, &self.indexes, &self.store);

        let mut event = MutationEvent::new(Operation::Update);
        for id in ids {
            let Some(backup) = self.store.get(id).cloned() else {
                continue;
            };
            match self.update_record(id, backup, &change_triples) {
                Ok(updated) => event.updated.push(updated),
                Err(restored) => event.failed.push(restored),
            }
        }
        self.events.publish(event.clone());
        Ok(event)
    }

    /// Inserts or overwrites records, resolving each by identity or primary
    /// key.
    ///
    /// A record carrying a live `_id` overwrites that record. Otherwise the
    /// primary key value is looked up: a hit overwrites, a miss inserts. A
    /// record with neither a live identity nor a primary key value fails.
    pub fn upsert(&mut self, records: Vec<Value>) -> MutationEvent {
        let mut event = MutationEvent::new(Operation::Upsert);
        for record in records {
            match self.upsert_inner(record) {
                Ok(Upserted::Inserted(inserted)) => event.inserted.push(inserted),
                Ok(Upserted::Updated(updated)) => event.updated.push(updated),
                Err((failed, err)) => {
                    log::warn!("upsert rejected a record: {err}");
                    event.failed.push(failed);
                }
            }
        }
        self.events.publish(event.clone());
        event
    }

    /// Upserts one record, reporting how it resolved.
    pub fn upsert_one(&mut self, record: Value) -> StoreResult<Upserted> {
        let mut event = MutationEvent::new(Operation::Upsert);
        let outcome = self.upsert_inner(record);
        match outcome {
            Ok(Upserted::Inserted(inserted)) => {
                event.inserted.push(inserted.clone());
                self.events.publish(event);
                Ok(Upserted::Inserted(inserted))
            }
            Ok(Upserted::Updated(updated)) => {
                event.updated.push(updated.clone());
                self.events.publish(event);
                Ok(Upserted::Updated(updated))
            }
            Err((failed, err)) => {
                event.failed.push(failed);
                self.events.publish(event);
                Err(err)
            }
        }
    }

    /// Removes every record matching a condition.
    pub fn delete(&mut self, condition: &Value) -> StoreResult<MutationEvent> {
        let triples = query::compile_query(condition)?;
        let ids = planner::execute(&triples, &self.indexes, &self.store);

        let mut event = MutationEvent::new(Operation::Delete);
        for id in ids {
            if let Some(record) = self.store.remove(id) {
                self.indexes.remove_record(&record, id);
                event.deleted.push(record);
            }
        }
        self.events.publish(event.clone());
        Ok(event)
    }

    fn insert_inner(&mut self, mut record: Value) -> Result<Value, (Value, StoreError)> {
        let id = match self.store.assign_identity(&mut record) {
            Ok(id) => id,
            Err(err) => return Err((record, err)),
        };
        if let Err(err) = self.indexes.add_record(&record, id) {
            // The identity stays consumed; the record goes back uncommitted.
            if let Some(fields) = record.as_object_mut() {
                fields.remove(ID_FIELD);
            }
            return Err((record, err));
        }
        self.store.put(id, record.clone());
        Ok(record)
    }

    /// Removes, mutates and re-indexes one record.
    ///
    /// A changeset that fails mid-application is logged and the partially
    /// mutated record proceeds to re-indexing; only an index violation rolls
    /// the record back to `backup`. Returns the post-update record, or the
    /// restored one on rollback.
    fn update_record(
        &mut self,
        id: RecordId,
        backup: Value,
        triples: &[ChangeTriple],
    ) -> Result<Value, Value> {
        self.indexes.remove_record(&backup, id);
        if let Some(record) = self.store.get_mut(id) {
            if let Err(err) = query::apply_changes(record, triples) {
                log::warn!("changeset stopped mid-application on record {id}: {err}");
            }
        }
        let current = match self.store.get(id) {
            Some(record) => record.clone(),
            None => backup.clone(),
        };
        match self.indexes.add_record(&current, id) {
            Ok(()) => Ok(current),
            Err(err) => {
                log::warn!("update violated an index on record {id}, restoring: {err}");
                self.store.put(id, backup.clone());
                if let Err(err) = self.indexes.add_record(&backup, id) {
                    log::warn!("restored record {id} could not be re-indexed: {err}");
                }
                Err(backup)
            }
        }
    }

    fn upsert_inner(&mut self, record: Value) -> Result<Upserted, (Value, StoreError)> {
        let by_id = record
            .get(ID_FIELD)
            .and_then(Value::as_u64)
            .filter(|id| self.store.contains(*id));
        if let Some(id) = by_id {
            return self.overwrite(id, &record);
        }
        if record.get(ID_FIELD).is_some() {
            // A stale or malformed identity cannot match; the insert path
            // rejects the caller-supplied _id.
            return self.insert_inner(record).map(Upserted::Inserted);
        }

        let Some(key) = self.primary_key.clone() else {
            return Err((record, StoreError::MissingKey));
        };
        let Some(value) = path::resolve(&record, &key).cloned() else {
            return Err((record, StoreError::MissingKey));
        };
        let existing = self
            .indexes
            .get(&key)
            .and_then(|index| index.find_value(&value))
            .and_then(|bucket| bucket.first())
            .copied();
        match existing {
            Some(id) => self.overwrite(id, &record),
            None => self.insert_inner(record).map(Upserted::Inserted),
        }
    }

    /// Overwrites a stored record field by field with an upsert payload.
    fn overwrite(&mut self, id: RecordId, record: &Value) -> Result<Upserted, (Value, StoreError)> {
        let triples = query::set_triples_from_record(record);
        let Some(backup) = self.store.get(id).cloned() else {
            return Err((record.clone(), StoreError::MissingKey));
        };
        match self.update_record(id, backup, &triples) {
            Ok(updated) => Ok(Upserted::Updated(updated)),
            Err(_) => Err((record.clone(), StoreError::UpdateIndexViolation)),
        }
    }
}
