//! objdb — an embeddable, in-process document store
//!
//! Records are schemaless JSON objects held in memory by a [`Collection`].
//! Declarative conditions (`{"age": {"$ge": 18}}`) and changesets
//! (`{"age": {"$inc": 1}}`) compile to ordered triples; secondary indexes
//! over property paths accelerate equality-shaped lookups through a small
//! planner; mutations keep store and indexes consistent record by record
//! and report their outcome as events.
//!
//! ```
//! use serde_json::json;
//! use objdb::Collection;
//!
//! let mut people = Collection::with_primary_key("email");
//! people.add_index("age", false, false)?;
//!
//! people.insert(vec![
//!     json!({"email": "ada@example.com", "age": 36}),
//!     json!({"email": "alan@example.com", "age": 41}),
//! ]);
//!
//! let adults = people.find(&json!({"age": {"$ge": 40}}))?;
//! assert_eq!(adults.len(), 1);
//! assert_eq!(adults[0]["email"], json!("alan@example.com"));
//! # Ok::<(), objdb::StoreError>(())
//! ```

pub mod collection;
pub mod error;
pub mod events;
pub mod index;
pub mod path;
pub mod planner;
pub mod query;
pub mod snapshot;
pub mod store;

pub use collection::{Collection, Upserted};
pub use error::{StoreError, StoreResult};
pub use events::{DispatchMode, EventKind, MutationEvent, Operation};
pub use index::{Index, IndexDef, IndexSet};
pub use snapshot::Snapshot;
pub use store::{Record, RecordId, ID_FIELD};
