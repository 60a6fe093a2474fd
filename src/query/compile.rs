//! Condition and changeset compilation
//!
//! Turns declarative condition/changeset objects into ordered triples. A
//! scalar field value is shorthand for `$eq` in queries and `$set` in
//! changesets; an object value is a map of `{operator: operand}` entries, so
//! one path may yield several triples. Unknown operators and structurally
//! bad operands are rejected here, before any record is touched.

use regex::Regex;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::path::{parse_segment, Segment};

use super::ast::{ChangeOp, ChangeTriple, QueryOp, QueryTriple};

/// Compiles a condition object into ordered query triples.
pub fn compile_query(condition: &Value) -> StoreResult<Vec<QueryTriple>> {
    let fields = condition
        .as_object()
        .ok_or_else(|| StoreError::invalid_argument("query must be an object"))?;
    let mut triples = Vec::with_capacity(fields.len());
    for (path, value) in fields {
        match value {
            Value::Object(ops) => {
                for (name, operand) in ops {
                    let op = QueryOp::parse(name)
                        .ok_or_else(|| StoreError::InvalidOperator(name.clone()))?;
                    validate_query_operand(op, operand)?;
                    triples.push(QueryTriple::new(path.clone(), op, operand.clone()));
                }
            }
            scalar => triples.push(QueryTriple::new(path.clone(), QueryOp::Eq, scalar.clone())),
        }
    }
    Ok(triples)
}

/// Compiles a changeset object into ordered change triples.
pub fn compile_changes(changes: &Value) -> StoreResult<Vec<ChangeTriple>> {
    let fields = changes
        .as_object()
        .ok_or_else(|| StoreError::invalid_argument("changeset must be an object"))?;
    let mut triples = Vec::with_capacity(fields.len());
    for (path, value) in fields {
        validate_change_path(path)?;
        match value {
            Value::Object(ops) => {
                for (name, operand) in ops {
                    let op = ChangeOp::parse(name)
                        .ok_or_else(|| StoreError::InvalidOperator(name.clone()))?;
                    triples.push(ChangeTriple::new(path.clone(), op, operand.clone()));
                }
            }
            scalar => triples.push(ChangeTriple::new(path.clone(), ChangeOp::Set, scalar.clone())),
        }
    }
    Ok(triples)
}

/// Builds the `$set` changeset an upsert applies to an existing record.
///
/// Every top-level field of the record becomes one `$set` triple, taken
/// literally (object values are never re-parsed as operator maps). The
/// identity field is skipped; it is the lookup key and never mutates.
pub fn set_triples_from_record(record: &Value) -> Vec<ChangeTriple> {
    let Some(fields) = record.as_object() else {
        return Vec::new();
    };
    fields
        .iter()
        .filter(|(name, _)| name.as_str() != crate::store::ID_FIELD)
        .map(|(name, value)| ChangeTriple::new(name.clone(), ChangeOp::Set, value.clone()))
        .collect()
}

fn validate_query_operand(op: QueryOp, operand: &Value) -> StoreResult<()> {
    match op {
        QueryOp::In | QueryOp::Nin => {
            if !operand.is_array() {
                return Err(StoreError::invalid_argument(format!(
                    "{} requires a list operand",
                    op.as_str()
                )));
            }
        }
        QueryOp::Match => {
            let pattern = operand.as_str().ok_or_else(|| {
                StoreError::invalid_argument("$match requires a string pattern")
            })?;
            Regex::new(pattern)
                .map_err(|err| StoreError::invalid_argument(format!("bad $match pattern: {err}")))?;
        }
        _ => {}
    }
    Ok(())
}

/// Mutation paths must end in a plain field name; list elements cannot be
/// assigned through a bracketed final segment.
fn validate_change_path(path: &str) -> StoreResult<()> {
    let last = path.rsplit('.').next().unwrap_or(path);
    match parse_segment(last) {
        Some(Segment::Field(_)) => Ok(()),
        Some(Segment::Element(..)) => Err(StoreError::invalid_argument(format!(
            "changeset path {path} must end in a field name"
        ))),
        None => Err(StoreError::invalid_argument(format!(
            "malformed changeset path: {path}"
        ))),
    }
}
