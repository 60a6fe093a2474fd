//! Index selection and query execution
//!
//! Planning picks at most one triple to answer from an index; the rest stay
//! residual and are evaluated per candidate. Selectivity is approximated by
//! an index's partition count, so the most-partitioned eligible index wins.

use crate::index::IndexSet;
use crate::query::matching;
use crate::query::QueryTriple;
use crate::store::{RecordId, RecordStore};

/// Picks the triple to answer from an index, if any.
///
/// A triple is eligible when its operator admits a bucket lookup and an
/// index covers its path. Among eligible triples the one whose index has the
/// most partitions wins; ties keep the first-encountered triple. Returns the
/// winning triple's position.
pub fn choose_plan(triples: &[QueryTriple], indexes: &IndexSet) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (position, triple) in triples.iter().enumerate() {
        if !triple.op.index_eligible() {
            continue;
        }
        let Some(index) = indexes.get(&triple.path) else {
            continue;
        };
        let partitions = index.partitions();
        match best {
            Some((_, best_partitions)) if partitions <= best_partitions => {}
            _ => best = Some((position, partitions)),
        }
    }
    best.map(|(position, _)| position)
}

/// Runs a compiled query, returning matching record ids in candidate order.
///
/// With a plan, candidates come from the chosen index's bucket(s) and the
/// chosen triple is dropped from the residual set. Without one, every record
/// is scanned in identity order.
pub fn execute(triples: &[QueryTriple], indexes: &IndexSet, store: &RecordStore) -> Vec<RecordId> {
    match choose_plan(triples, indexes) {
        Some(chosen) => {
            log::debug!(
                "query plan: index on '{}' covers {}, {} residual triple(s)",
                triples[chosen].path,
                triples[chosen].op.as_str(),
                triples.len() - 1
            );
            let residual: Vec<&QueryTriple> = triples
                .iter()
                .enumerate()
                .filter(|(position, _)| *position != chosen)
                .map(|(_, triple)| triple)
                .collect();
            candidate_ids(&triples[chosen], indexes)
                .into_iter()
                .filter(|id| {
                    store.get(*id).map_or(false, |record| {
                        residual.iter().all(|triple| matching::matches(record, triple))
                    })
                })
                .collect()
        }
        None => {
            log::debug!("query plan: full scan, {} triple(s)", triples.len());
            store
                .iter()
                .filter(|(_, record)| matching::matches_all(record, triples))
                .map(|(id, _)| id)
                .collect()
        }
    }
}

/// Candidate ids for an index-answered triple.
///
/// `$eq` and `$contains` read one bucket. `$in` unions the operand values'
/// buckets in operand order, de-duplicating ids already taken.
fn candidate_ids(triple: &QueryTriple, indexes: &IndexSet) -> Vec<RecordId> {
    let Some(index) = indexes.get(&triple.path) else {
        return Vec::new();
    };
    match triple.op {
        crate::query::QueryOp::In => {
            let Some(values) = triple.operand.as_array() else {
                return Vec::new();
            };
            let mut ids = Vec::new();
            for value in values {
                if let Some(bucket) = index.find_value(value) {
                    for id in bucket {
                        if !ids.contains(id) {
                            ids.push(*id);
                        }
                    }
                }
            }
            ids
        }
        _ => index
            .find_value(&triple.operand)
            .map(<[RecordId]>::to_vec)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryOp;
    use serde_json::json;

    fn fixture() -> (RecordStore, IndexSet) {
        let mut store = RecordStore::new();
        let mut indexes = IndexSet::new();
        indexes.attach(crate::index::Index::new("kind", false, false));
        indexes.attach(crate::index::Index::new("name", false, false));
        for (kind, name, size) in [
            ("a", "one", 1),
            ("a", "two", 2),
            ("b", "three", 3),
            ("b", "four", 4),
        ] {
            let mut record = json!({"kind": kind, "name": name, "size": size});
            let id = store.assign_identity(&mut record).unwrap();
            indexes.add_record(&record, id).unwrap();
            store.put(id, record);
        }
        (store, indexes)
    }

    #[test]
    fn test_plan_prefers_most_partitioned_index() {
        let (_, indexes) = fixture();
        // "kind" has 2 partitions, "name" has 4.
        let triples = vec![
            QueryTriple::new("kind", QueryOp::Eq, json!("a")),
            QueryTriple::new("name", QueryOp::Eq, json!("one")),
        ];
        assert_eq!(choose_plan(&triples, &indexes), Some(1));
    }

    #[test]
    fn test_plan_tie_keeps_first_triple() {
        let mut indexes = IndexSet::new();
        indexes.attach(crate::index::Index::new("a", false, false));
        indexes.attach(crate::index::Index::new("b", false, false));
        let triples = vec![
            QueryTriple::new("a", QueryOp::Eq, json!(1)),
            QueryTriple::new("b", QueryOp::Eq, json!(2)),
        ];
        assert_eq!(choose_plan(&triples, &indexes), Some(0));
    }

    #[test]
    fn test_plan_skips_ineligible_operators_and_unindexed_paths() {
        let (_, indexes) = fixture();
        let triples = vec![
            QueryTriple::new("kind", QueryOp::Ne, json!("a")),
            QueryTriple::new("size", QueryOp::Eq, json!(3)),
        ];
        assert_eq!(choose_plan(&triples, &indexes), None);
    }

    #[test]
    fn test_indexed_execution_applies_residual() {
        let (store, indexes) = fixture();
        let triples = vec![
            QueryTriple::new("kind", QueryOp::Eq, json!("b")),
            QueryTriple::new("size", QueryOp::Gt, json!(3)),
        ];
        assert_eq!(execute(&triples, &indexes, &store), vec![3]);
    }

    #[test]
    fn test_full_scan_in_identity_order() {
        let (store, indexes) = fixture();
        let triples = vec![QueryTriple::new("size", QueryOp::Ge, json!(2))];
        assert_eq!(execute(&triples, &indexes, &store), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_query_full_scan_returns_everything() {
        let (store, indexes) = fixture();
        assert_eq!(execute(&[], &indexes, &store), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_in_union_ordered_and_deduplicated() {
        let (store, indexes) = fixture();
        let triples = vec![QueryTriple::new(
            "kind",
            QueryOp::In,
            json!(["b", "a", "b"]),
        )];
        // Bucket order within a value, operand order across values.
        assert_eq!(execute(&triples, &indexes, &store), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_contains_uses_element_buckets() {
        let mut store = RecordStore::new();
        let mut indexes = IndexSet::new();
        indexes.attach(crate::index::Index::new("tags", false, false));
        for tags in [json!(["x", "y"]), json!(["y"]), json!(["z"])] {
            let mut record = json!({ "tags": tags });
            let id = store.assign_identity(&mut record).unwrap();
            indexes.add_record(&record, id).unwrap();
            store.put(id, record);
        }
        let triples = vec![QueryTriple::new("tags", QueryOp::Contains, json!("y"))];
        assert_eq!(execute(&triples, &indexes, &store), vec![0, 1]);
    }

    #[test]
    fn test_missing_bucket_yields_no_candidates() {
        let (store, indexes) = fixture();
        let triples = vec![QueryTriple::new("kind", QueryOp::Eq, json!("zzz"))];
        assert!(execute(&triples, &indexes, &store).is_empty());
    }
}
