//! Total-ordered index bucket keys
//!
//! Resolved values become `ValueKey`s so buckets live in a `BTreeMap` with a
//! deterministic ordering: Null < Bool < Int < Float < Str < Compound.
//! Floats are stored as total-ordering bits; integral floats share a bucket
//! with the equal integer so `1` and `1.0` index identically. Compound keys
//! are canonical JSON: object fields sorted by name, numbers normalized the
//! same way as scalars, so deeply-equal values always share a bucket.

use serde_json::Value;

/// Index key derived from a resolved property value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKey {
    /// Explicit null value
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Non-integral float (stored as bits for total ordering)
    Float(u64),
    /// String value
    Str(String),
    /// Nested list/map value, keyed by its canonical JSON text
    Compound(String),
}

impl ValueKey {
    /// Builds the bucket key for a value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = integral(n) {
                    return ValueKey::Int(i);
                }
                match n.as_f64() {
                    Some(f) => ValueKey::Float(total_order_bits(f)),
                    None => ValueKey::Float(total_order_bits(0.0)),
                }
            }
            Value::String(s) => ValueKey::Str(s.clone()),
            compound => {
                let mut text = String::new();
                write_canonical(compound, &mut text);
                ValueKey::Compound(text)
            }
        }
    }
}

/// The integer a number normalizes to, if it has one.
///
/// Non-integral floats and u64 values beyond `i64::MAX` have none.
fn integral(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Some(f as i64)
        }
        _ => None,
    }
}

/// Writes a value as canonical JSON: object fields sorted by name, numbers
/// normalized to their integer spelling when integral. Field order and
/// numeric representation never split deeply-equal values across buckets.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(elements) => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(element, out);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            let mut names: Vec<&String> = fields.keys().collect();
            names.sort_unstable();
            out.push('{');
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*name).clone()).to_string());
                out.push(':');
                write_canonical(&fields[name.as_str()], out);
            }
            out.push('}');
        }
        Value::Number(n) => match integral(n) {
            Some(i) => out.push_str(&i.to_string()),
            None => out.push_str(&n.to_string()),
        },
        leaf => out.push_str(&leaf.to_string()),
    }
}

/// Maps a float to bits whose unsigned order matches the float order.
fn total_order_bits(value: f64) -> u64 {
    let bits = value.to_bits();
    if (bits >> 63) == 1 {
        !bits
    } else {
        bits ^ (1 << 63)
    }
}
