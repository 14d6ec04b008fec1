//! Depth-bounded key rewriting in both directions
//!
//! Only records and non-empty arrays made entirely of records are entered.
//! Arrays holding anything else pass through untouched, including any records
//! they contain, which keeps the rewriter in step with key collection.

use crate::collector::is_record_array;
use crate::CompressOptions;
use jkc_format::constants::EXPAND_MAX_DEPTH;
use jkc_format::KeyTable;
use serde_json::{Map, Value};

/// Rewrite direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Canonical name -> alias
    Compress,
    /// Alias -> canonical name
    Expand,
}

/// Applies a key table to a tree
///
/// Records at depth `>= max_depth` are returned unmodified. A top-level array
/// does not count as a level: its records sit at depth 0.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    table: &'a KeyTable,
    direction: Direction,
    max_depth: usize,
    descend_records: bool,
}

impl<'a> Rewriter<'a> {
    /// Rewriter renaming canonical names to aliases under `opts`
    pub fn compress(table: &'a KeyTable, opts: &CompressOptions) -> Self {
        Self {
            table,
            direction: Direction::Compress,
            max_depth: opts.effective_depth(),
            descend_records: opts.descends_into_records(),
        }
    }

    /// Rewriter restoring canonical names, always bounded by the fixed expand ceiling
    pub fn expand(table: &'a KeyTable) -> Self {
        Self {
            table,
            direction: Direction::Expand,
            max_depth: EXPAND_MAX_DEPTH,
            descend_records: true,
        }
    }

    /// Rewrite a record, an array of records, or pass anything else through
    pub fn rewrite(&self, value: &Value) -> Value {
        self.rewrite_at(value, 0)
    }

    fn rewrite_at(&self, value: &Value, depth: usize) -> Value {
        match value {
            Value::Object(record) if depth < self.max_depth => {
                Value::Object(self.rewrite_record(record, depth))
            }
            Value::Array(items) if depth < self.max_depth && is_record_array(items) => {
                Value::Array(
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|record| Value::Object(self.rewrite_record(record, depth)))
                        .collect(),
                )
            }
            other => other.clone(),
        }
    }

    fn rewrite_record(&self, record: &Map<String, Value>, depth: usize) -> Map<String, Value> {
        record
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Object(_) if self.descend_records => self.rewrite_at(value, depth + 1),
                    Value::Array(_) => self.rewrite_at(value, depth + 1),
                    other => other.clone(),
                };
                (self.rename(key).to_string(), value)
            })
            .collect()
    }

    fn rename<'k>(&'k self, key: &'k str) -> &'k str {
        match self.direction {
            Direction::Compress => self.table.stored_key(key),
            Direction::Expand => self.table.canonical_key(key),
        }
    }
}

/// Rename canonical keys to aliases
pub fn compress_tree(value: &Value, table: &KeyTable, opts: &CompressOptions) -> Value {
    Rewriter::compress(table, opts).rewrite(value)
}

/// Restore canonical keys, up to the fixed expand ceiling
pub fn expand_tree(value: &Value, table: &KeyTable) -> Value {
    Rewriter::expand(table).rewrite(value)
}
