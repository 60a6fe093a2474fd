//! Property path resolution
//!
//! A path addresses a (possibly nested) field of a record: dot-separated
//! segments, where a segment may use `name[index]` for list element access.
//! Resolution never fails with an error: any missing field, wrong shape, or
//! out-of-range index yields `None`, the universal "no value" signal consumed
//! by indexing and matching.

use serde_json::Value;

/// One parsed path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain field access (`name`)
    Field(&'a str),
    /// List element access (`name[index]`)
    Element(&'a str, usize),
}

/// Parses a single path segment.
///
/// Returns `None` for malformed segments (empty name, bad index syntax).
pub fn parse_segment(segment: &str) -> Option<Segment<'_>> {
    if segment.is_empty() {
        return None;
    }
    match segment.find('[') {
        None => Some(Segment::Field(segment)),
        Some(open) => {
            if open == 0 || !segment.ends_with(']') {
                return None;
            }
            let name = &segment[..open];
            let index = segment[open + 1..segment.len() - 1].parse().ok()?;
            Some(Segment::Element(name, index))
        }
    }
}

/// Resolves a path against a record.
///
/// Walks left to right; returns `None` on any miss.
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = record;
    for segment in path.split('.') {
        match parse_segment(segment)? {
            Segment::Field(name) => {
                current = current.as_object()?.get(name)?;
            }
            Segment::Element(name, index) => {
                current = current.as_object()?.get(name)?.as_array()?.get(index)?;
            }
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_field() {
        let record = json!({"a": 1, "b": "two"});
        assert_eq!(resolve(&record, "a"), Some(&json!(1)));
        assert_eq!(resolve(&record, "b"), Some(&json!("two")));
    }

    #[test]
    fn test_nested_field() {
        let record = json!({"a": {"b": {"c": 3}}});
        assert_eq!(resolve(&record, "a.b.c"), Some(&json!(3)));
        assert_eq!(resolve(&record, "a.b"), Some(&json!({"c": 3})));
    }

    #[test]
    fn test_list_element() {
        let record = json!({"a": [10, 20, 30]});
        assert_eq!(resolve(&record, "a[0]"), Some(&json!(10)));
        assert_eq!(resolve(&record, "a[2]"), Some(&json!(30)));
    }

    #[test]
    fn test_mixed_path() {
        let record = json!({"a": [{"b": [1, 2]}, {"b": [3, 4]}]});
        assert_eq!(resolve(&record, "a[1].b[0]"), Some(&json!(3)));
    }

    #[test]
    fn test_missing_is_none_not_error() {
        let record = json!({"a": {"b": 1}, "c": [1]});
        assert_eq!(resolve(&record, "x"), None);
        assert_eq!(resolve(&record, "a.x"), None);
        assert_eq!(resolve(&record, "a.b.c"), None); // descend through a scalar
        assert_eq!(resolve(&record, "c[5]"), None); // out of range
        assert_eq!(resolve(&record, "a[0]"), None); // index into an object
    }

    #[test]
    fn test_malformed_segments() {
        let record = json!({"a": [1]});
        assert_eq!(resolve(&record, ""), None);
        assert_eq!(resolve(&record, "a["), None);
        assert_eq!(resolve(&record, "a[x]"), None);
        assert_eq!(resolve(&record, "[0]"), None);
        assert_eq!(resolve(&record, "a..b"), None);
    }

    #[test]
    fn test_parse_segment() {
        assert_eq!(parse_segment("name"), Some(Segment::Field("name")));
        assert_eq!(parse_segment("items[3]"), Some(Segment::Element("items", 3)));
        assert_eq!(parse_segment("items[3"), None);
        assert_eq!(parse_segment(""), None);
    }
}
