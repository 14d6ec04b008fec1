//! Key discovery over record trees

use crate::CompressOptions;
use ahash::{AHashMap, AHashSet};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Collect every field name eligible for aliasing
///
/// Names from all levels land in one flat set. Recursion follows nested
/// arrays of records and, unless `nested_handling` is shallow or arrays,
/// single nested records, stopping at the effective depth.
pub fn collect_keys(records: &[Value], opts: &CompressOptions) -> BTreeSet<String> {
    let names = collect_level(
        records.iter().filter_map(Value::as_object),
        opts,
        0,
        opts.effective_depth(),
    );
    tracing::trace!(
        records = records.len(),
        candidates = names.len(),
        "collected candidate keys"
    );
    names
}

fn collect_level<'a, I>(
    records: I,
    opts: &CompressOptions,
    depth: usize,
    max_depth: usize,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut names = BTreeSet::new();
    if depth >= max_depth {
        return names;
    }

    let mut counts: AHashMap<&'a str, usize> = AHashMap::new();
    let mut siblings = 0usize;

    for record in records {
        siblings += 1;
        for (key, value) in record {
            if opts.is_eligible(key) {
                names.insert(key.clone());
                *counts.entry(key.as_str()).or_insert(0) += 1;
            }

            match value {
                Value::Array(items) if is_record_array(items) => {
                    names.extend(collect_level(
                        items.iter().filter_map(Value::as_object),
                        opts,
                        depth + 1,
                        max_depth,
                    ));
                }
                Value::Object(nested) if opts.descends_into_records() => {
                    names.extend(collect_level(
                        std::iter::once(nested),
                        opts,
                        depth + 1,
                        max_depth,
                    ));
                }
                _ => {}
            }
        }
    }

    if opts.homogeneous_only {
        for (key, count) in counts {
            if count < siblings {
                names.remove(key);
            }
        }
    }

    names
}

/// Every key name present in records up to `max_depth`
///
/// Traversal follows every nested record and every array of records,
/// matching what expansion can reach.
pub fn observed_keys(value: &Value, max_depth: usize) -> AHashSet<String> {
    let mut seen = AHashSet::new();
    observe(value, 0, max_depth, &mut seen);
    seen
}

fn observe(value: &Value, depth: usize, max_depth: usize, seen: &mut AHashSet<String>) {
    if depth >= max_depth {
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if !seen.contains(key.as_str()) {
                    seen.insert(key.clone());
                }
                observe(child, depth + 1, max_depth, seen);
            }
        }
        Value::Array(items) if is_record_array(items) => {
            for item in items {
                observe(item, depth, max_depth, seen);
            }
        }
        _ => {}
    }
}

/// Non-empty array whose elements are all records
pub fn is_record_array(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}
