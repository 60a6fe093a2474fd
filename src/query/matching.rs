//! Predicate evaluation for query execution
//!
//! Residual triples are evaluated per record with AND semantics and
//! short-circuit on the first failure. An unresolved path fails every
//! operator. Comparisons are finite matches over value tags: numbers compare
//! numerically across representations, strings lexicographically, and
//! incomparable types yield no-match rather than an error.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::path;

use super::ast::{QueryOp, QueryTriple};

/// Checks whether a record satisfies every triple.
pub fn matches_all(record: &Value, triples: &[QueryTriple]) -> bool {
    triples.iter().all(|triple| matches(record, triple))
}

/// Checks whether a record satisfies a single triple.
pub fn matches(record: &Value, triple: &QueryTriple) -> bool {
    let Some(value) = path::resolve(record, &triple.path) else {
        return false;
    };
    match triple.op {
        QueryOp::Eq => value_eq(value, &triple.operand),
        QueryOp::Ne => !value_eq(value, &triple.operand),
        QueryOp::Lt => compare(value, &triple.operand) == Some(Ordering::Less),
        QueryOp::Gt => compare(value, &triple.operand) == Some(Ordering::Greater),
        QueryOp::Le => matches!(
            compare(value, &triple.operand),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        QueryOp::Ge => matches!(
            compare(value, &triple.operand),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        QueryOp::In => triple
            .operand
            .as_array()
            .map_or(false, |list| list.iter().any(|item| value_eq(value, item))),
        QueryOp::Nin => triple
            .operand
            .as_array()
            .map_or(false, |list| !list.iter().any(|item| value_eq(value, item))),
        QueryOp::Match => match (value.as_str(), triple.operand.as_str()) {
            (Some(text), Some(pattern)) => Regex::new(pattern)
                .map(|re| re.is_match(text))
                .unwrap_or(false),
            _ => false,
        },
        QueryOp::Contains => value
            .as_array()
            .map_or(false, |list| list.iter().any(|item| value_eq(item, &triple.operand))),
    }
}

/// Deep equality with numeric cross-representation equality (1 == 1.0).
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => match (x.as_f64(), y.as_f64()) {
                (Some(f), Some(g)) => f == g,
                _ => false,
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| value_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).map_or(false, |y| value_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering over number-number and string-string pairs; `None` otherwise.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(i), Some(j)) = (x.as_i64(), y.as_i64()) {
                return Some(i.cmp(&j));
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(f), Some(g)) => f.partial_cmp(&g),
                _ => None,
            }
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
