//! Changeset application
//!
//! Applies change triples to a record in place, in triple order. Operators
//! act on the path's current value; absence is tolerated for the
//! list-building operators (the list is created empty first) and for
//! arithmetic (the base is 0). Missing intermediate objects on the path are
//! created; an intermediate with the wrong shape is a `TypeMismatch`.

use serde_json::map::Map;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::path::{parse_segment, Segment};

use super::ast::{ChangeOp, ChangeTriple};
use super::matching::value_eq;

/// Applies every triple in order, stopping at the first failure.
///
/// A failure may leave the record partially mutated; the caller decides
/// whether to keep or roll back the result.
pub fn apply_changes(record: &mut Value, triples: &[ChangeTriple]) -> StoreResult<()> {
    for triple in triples {
        apply_one(record, triple)?;
    }
    Ok(())
}

fn apply_one(record: &mut Value, triple: &ChangeTriple) -> StoreResult<()> {
    let (owner, leaf) = owner_of(record, &triple.path)?;
    match triple.op {
        ChangeOp::Set => {
            owner.insert(leaf, triple.operand.clone());
            Ok(())
        }
        ChangeOp::Inc => apply_arith(owner, leaf, &triple.operand, false),
        ChangeOp::Dec => apply_arith(owner, leaf, &triple.operand, true),
        ChangeOp::Push => {
            let list = list_entry(owner, leaf)?;
            list.push(triple.operand.clone());
            Ok(())
        }
        ChangeOp::Concat => {
            let elements = triple
                .operand
                .as_array()
                .ok_or_else(|| StoreError::type_mismatch("$concat operand must be a list"))?
                .clone();
            let list = list_entry(owner, leaf)?;
            list.extend(elements);
            Ok(())
        }
        ChangeOp::SetAdd => {
            let list = list_entry(owner, leaf)?;
            if !list.iter().any(|item| value_eq(item, &triple.operand)) {
                list.push(triple.operand.clone());
            }
            Ok(())
        }
        ChangeOp::Pop => {
            let count = triple
                .operand
                .as_i64()
                .ok_or_else(|| StoreError::type_mismatch("$pop operand must be an integer"))?;
            let list = list_entry(owner, leaf)?;
            if count > 0 {
                let keep = list.len().saturating_sub(count as usize);
                list.truncate(keep);
            } else {
                let drop = (count.unsigned_abs() as usize).min(list.len());
                list.drain(..drop);
            }
            Ok(())
        }
        ChangeOp::Pull => {
            let list = list_entry(owner, leaf)?;
            match &triple.operand {
                Value::Array(values) => {
                    list.retain(|item| !values.iter().any(|v| value_eq(item, v)));
                }
                value => list.retain(|item| !value_eq(item, value)),
            }
            Ok(())
        }
    }
}

/// Navigates to the map owning the final path segment, creating missing
/// intermediate objects. Bracketed intermediates must already exist.
fn owner_of<'a>(
    record: &'a mut Value,
    path: &str,
) -> StoreResult<(&'a mut Map<String, Value>, String)> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = match segments.pop().map(parse_segment) {
        Some(Some(Segment::Field(name))) => name.to_string(),
        // Compilation already rejects bracketed or malformed final segments.
        _ => {
            return Err(StoreError::invalid_argument(format!(
                "malformed changeset path: {path}"
            )))
        }
    };
    let mut current = record;
    for raw in segments {
        match parse_segment(raw) {
            Some(Segment::Field(name)) => {
                let map = as_map(current, raw)?;
                current = map
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
            Some(Segment::Element(name, index)) => {
                let map = as_map(current, raw)?;
                let list = map
                    .get_mut(name)
                    .and_then(Value::as_array_mut)
                    .ok_or_else(|| {
                        StoreError::type_mismatch(format!("{name} is not a list in path {path}"))
                    })?;
                current = list.get_mut(index).ok_or_else(|| {
                    StoreError::type_mismatch(format!("index {index} out of range in path {path}"))
                })?;
            }
            None => {
                return Err(StoreError::invalid_argument(format!(
                    "malformed changeset path: {path}"
                )))
            }
        }
    }
    let map = as_map(current, &leaf)?;
    Ok((map, leaf))
}

fn as_map<'a>(value: &'a mut Value, segment: &str) -> StoreResult<&'a mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| StoreError::type_mismatch(format!("cannot descend into {segment}")))
}

/// Fetches the leaf as a mutable list, creating an empty one when absent.
fn list_entry<'a>(
    owner: &'a mut Map<String, Value>,
    leaf: String,
) -> StoreResult<&'a mut Vec<Value>> {
    let slot = owner.entry(leaf).or_insert_with(|| Value::Array(Vec::new()));
    slot.as_array_mut()
        .ok_or_else(|| StoreError::type_mismatch("existing value is not a list"))
}

fn apply_arith(
    owner: &mut Map<String, Value>,
    leaf: String,
    operand: &Value,
    negate: bool,
) -> StoreResult<()> {
    let result = match owner.get(&leaf) {
        None => arith_value(operand, None, negate)?,
        Some(Value::Number(base)) => {
            let base = base.clone();
            arith_value(operand, Some(&base), negate)?
        }
        Some(_) => {
            return Err(StoreError::type_mismatch(
                "arithmetic target is not a number",
            ))
        }
    };
    owner.insert(leaf, result);
    Ok(())
}

fn arith_value(
    operand: &Value,
    base: Option<&serde_json::Number>,
    negate: bool,
) -> StoreResult<Value> {
    let delta_int = operand.as_i64();
    let base_int = match base {
        None => Some(0),
        Some(n) => n.as_i64(),
    };
    if let (Some(b), Some(d)) = (base_int, delta_int) {
        let signed = if negate { d.checked_neg() } else { Some(d) };
        if let Some(sum) = signed.and_then(|d| b.checked_add(d)) {
            return Ok(Value::from(sum));
        }
    }
    let b = base.and_then(serde_json::Number::as_f64).unwrap_or(0.0);
    let d = operand
        .as_f64()
        .ok_or_else(|| StoreError::type_mismatch("arithmetic operand must be a number"))?;
    let sum = if negate { b - d } else { b + d };
    serde_json::Number::from_f64(sum)
        .map(Value::Number)
        .ok_or_else(|| StoreError::type_mismatch("arithmetic result is not a finite number"))
}
