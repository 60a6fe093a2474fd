//! Query compilation, matching and changeset application
//!
//! Conditions and changesets are declarative objects normalized into ordered
//! (path, operator, operand) triples. Matching evaluates query triples
//! against records; application executes change triples on a record in
//! place.

mod apply;
mod ast;
mod compile;
pub mod matching;

pub use apply::apply_changes;
pub use ast::{ChangeOp, ChangeTriple, QueryOp, QueryTriple};
pub use compile::{compile_changes, compile_query, set_triples_from_record};
