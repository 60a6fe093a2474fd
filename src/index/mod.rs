//! Secondary index structures
//!
//! An `Index` maps one property path's resolved values to the records that
//! hold them; an `IndexSet` is the group of indexes for one collection, kept
//! consistent with the record store by the mutation engine.

mod index;
mod key;
mod set;

pub use index::{Index, IndexDef};
pub use key::ValueKey;
pub use set::IndexSet;
