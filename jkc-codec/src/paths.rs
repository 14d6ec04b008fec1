//! Path-addressed compression of several arrays inside one response
//!
//! Used for responses (typically GraphQL) where compressible arrays sit at
//! arbitrary positions. Every qualifying array is located, one table is built
//! across all of them, and each array is renamed in place. Paths are rooted at
//! the envelope, so the response payload lives under `data`.
//!
//! An excluded path is never located, and when it lies inside a located array
//! its subtree keeps its original keys.

use crate::collector::{collect_keys, is_record_array, observed_keys};
use crate::namespace::build_table_with;
use crate::transform::{compress_tree, expand_tree};
use crate::view::{view_tree, ViewValue};
use crate::CompressOptions;
use ahash::AHashSet;
use jkc_format::constants::{DEFAULT_MIN_ARRAY_LENGTH, EXPAND_MAX_DEPTH, FIELD_DATA};
use jkc_format::{JkcError, PathEnvelope, Result, TreePath};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Caller predicate deciding whether a located array is compressed
pub type ArrayPredicate = Arc<dyn Fn(&TreePath, &[Value]) -> bool + Send + Sync>;

/// Options for path-addressed compression
#[derive(Clone)]
pub struct PathOptions {
    /// Options applied to each located array
    pub compress: CompressOptions,
    /// Arrays shorter than this are left alone
    pub min_array_length: usize,
    /// Paths (and everything beneath them) never compressed
    pub exclude_paths: Vec<TreePath>,
    /// Optional extra filter
    pub predicate: Option<ArrayPredicate>,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            compress: CompressOptions::default(),
            min_array_length: DEFAULT_MIN_ARRAY_LENGTH,
            exclude_paths: Vec::new(),
            predicate: None,
        }
    }
}

impl fmt::Debug for PathOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathOptions")
            .field("compress", &self.compress)
            .field("min_array_length", &self.min_array_length)
            .field("exclude_paths", &self.exclude_paths)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl PathOptions {
    fn qualifies(&self, path: &TreePath, items: &[Value]) -> bool {
        is_record_array(items)
            && items.len() >= self.min_array_length
            && !self.exclude_paths.iter().any(|ex| path.starts_with(ex))
            && self.predicate.as_ref().map_or(true, |pred| pred(path, items))
    }
}

/// Locate every compressible array in `root`, in document order
///
/// Arrays nested inside a located array are located too.
pub fn locate_arrays(root: &Value, opts: &PathOptions) -> Vec<TreePath> {
    let mut found = Vec::new();
    walk(root, &TreePath::root(), opts, &mut found);
    found
}

fn walk(value: &Value, path: &TreePath, opts: &PathOptions, found: &mut Vec<TreePath>) {
    match value {
        Value::Array(items) => {
            if opts.qualifies(path, items) {
                found.push(path.clone());
            }
            for (idx, item) in items.iter().enumerate() {
                walk(item, &path.child_index(idx), opts, found);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                walk(child, &path.child_key(key.as_str()), opts, found);
            }
        }
        _ => {}
    }
}

fn rooted(data: &Value) -> Value {
    let mut root = Map::new();
    root.insert(FIELD_DATA.to_string(), data.clone());
    Value::Object(root)
}

fn data_root() -> TreePath {
    TreePath::root().child_key(FIELD_DATA)
}

/// Compress every located array of a response payload with one shared table
pub fn compress_paths(data: &Value, opts: &PathOptions) -> Result<PathEnvelope> {
    opts.compress.validate()?;

    let root = rooted(data);
    let paths = locate_arrays(&root, opts);

    let mut names = BTreeSet::new();
    let mut reserved = AHashSet::new();
    let reserve_depth = opts.compress.effective_depth().max(EXPAND_MAX_DEPTH);
    for path in &paths {
        let Some(array) = path.get(&root) else {
            continue;
        };
        if let Value::Array(items) = array {
            names.extend(collect_keys(items, &opts.compress));
            reserved.extend(observed_keys(array, reserve_depth));
        }
    }
    let table = build_table_with(&names, &opts.compress.key_pattern, |alias| {
        reserved.contains(alias)
    });

    // Deepest first: renaming an ancestor would otherwise move a pending path.
    let mut order: Vec<&TreePath> = paths.iter().collect();
    order.sort_by(|a, b| b.len().cmp(&a.len()));

    let pinned: Vec<(&TreePath, Value)> = opts
        .exclude_paths
        .iter()
        .filter(|excluded| {
            paths
                .iter()
                .any(|path| excluded.len() > path.len() && excluded.starts_with(path))
        })
        .filter_map(|excluded| excluded.get(&root).map(|value| (excluded, value.clone())))
        .collect();

    let mut out = root;
    for path in order {
        let Some(slot) = path.get_mut(&mut out) else {
            return Err(JkcError::PathNotFound {
                path: path.to_string(),
                reached: String::new(),
            });
        };
        *slot = compress_tree(slot, &table, &opts.compress);
    }
    for (excluded, original) in pinned {
        if let Some(slot) = excluded.get_aliased_mut(&mut out, &table) {
            *slot = original;
        }
    }

    tracing::debug!(
        arrays = paths.len(),
        aliases = table.len(),
        "compressed path-addressed response"
    );

    let data = match out {
        Value::Object(mut map) => map.remove(FIELD_DATA).unwrap_or(Value::Null),
        other => other,
    };
    Ok(PathEnvelope::new(data, table, paths))
}

/// Restore every located array of a path-addressed envelope
///
/// Paths are processed shallowest first so that each recorded path resolves
/// against already-restored ancestors.
pub fn expand_paths(envelope: &PathEnvelope) -> Result<Value> {
    let table = &envelope.meta.table;
    let mut order: Vec<&TreePath> = envelope.meta.paths.iter().collect();
    order.sort_by_key(|path| path.len());

    let mut out = rooted(&envelope.data);
    for path in order {
        let slot = path
            .get_aliased_mut(&mut out, table)
            .ok_or_else(|| JkcError::PathNotFound {
                path: path.to_string(),
                reached: String::new(),
            })?;
        *slot = expand_tree(slot, table);
    }

    Ok(match out {
        Value::Object(mut map) => map.remove(FIELD_DATA).unwrap_or(Value::Null),
        other => other,
    })
}

/// Lazy view of each located array, paired with its recorded path
pub fn view_paths(envelope: &PathEnvelope) -> Result<Vec<(&TreePath, ViewValue<'_>)>> {
    let table = &envelope.meta.table;
    let prefix = data_root();
    envelope
        .meta
        .paths
        .iter()
        .map(|path| {
            let not_found = || JkcError::PathNotFound {
                path: path.to_string(),
                reached: String::new(),
            };
            let inner = path.strip_prefix(&prefix).ok_or_else(not_found)?;
            let array = inner
                .get_aliased(&envelope.data, table)
                .ok_or_else(not_found)?;
            Ok((path, view_tree(array, table)))
        })
        .collect()
}
