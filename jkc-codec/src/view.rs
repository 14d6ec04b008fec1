//! Lazy read-through views over compressed records
//!
//! A [`RecordView`] answers reads, membership tests, enumeration and
//! serialization by canonical name while the underlying data keeps its
//! aliases. Nested records are wrapped on each read (views are cheap, borrowed
//! and never cached); arrays of records are materialized one level, with each
//! element wrapped as a view. Other arrays are returned untouched, as they are
//! by expansion. Views stop translating at the same fixed ceiling expansion
//! uses, so a view and an expanded tree always agree.
//!
//! A field may be stored under its alias or, when compression did not reach
//! its record (truncated depth, or nested records skipped by the nesting
//! mode), under its canonical name. Reads accept either.

use crate::collector::is_record_array;
use jkc_format::constants::EXPAND_MAX_DEPTH;
use jkc_format::{KeyTable, PathSegment, TreePath};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Canonical-name access shared by plain records and lazy views
pub trait FieldAccess<'a> {
    /// Value of a field by canonical name
    fn get_field(&self, name: &str) -> Option<ViewValue<'a>>;
    /// Whether a field with this canonical name exists
    fn has_field(&self, name: &str) -> bool;
    /// Canonical field names in stored order
    fn field_names(&self) -> Vec<&'a str>;
    /// Fully materialized record keyed by canonical names
    fn to_canonical_map(&self) -> Map<String, Value>;
}

/// Borrowed view of one compressed record
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    record: &'a Map<String, Value>,
    table: &'a KeyTable,
    depth: usize,
}

/// Value produced by reading through a view
#[derive(Debug, Clone)]
pub enum ViewValue<'a> {
    /// Primitive, or a subtree past the translation ceiling
    Plain(&'a Value),
    /// Nested record, still lazily translated
    Record(RecordView<'a>),
    /// Array of records, materialized one level
    Array(Vec<ViewValue<'a>>),
}

impl<'a> RecordView<'a> {
    /// Wrap a top-level compressed record
    pub fn new(record: &'a Map<String, Value>, table: &'a KeyTable) -> Self {
        Self::at_depth(record, table, 0)
    }

    fn at_depth(record: &'a Map<String, Value>, table: &'a KeyTable, depth: usize) -> Self {
        Self {
            record,
            table,
            depth,
        }
    }

    /// Underlying compressed record
    pub fn raw(&self) -> &'a Map<String, Value> {
        self.record
    }

    /// Table used for translation
    pub fn table(&self) -> &'a KeyTable {
        self.table
    }

    /// Read a field by canonical name
    pub fn get(&self, name: &str) -> Option<ViewValue<'a>> {
        let value = self.field(name)?;
        Some(wrap(value, self.table, self.depth + 1))
    }

    /// Whether a field with this canonical name exists on the record
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Canonical field names, never aliases
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        let table = self.table;
        self.record.keys().map(move |stored| table.canonical_key(stored))
    }

    /// Canonical `(name, value)` pairs in stored order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, ViewValue<'a>)> + 'a {
        let table = self.table;
        let depth = self.depth;
        self.record
            .iter()
            .map(move |(stored, value)| (table.canonical_key(stored), wrap(value, table, depth + 1)))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Follow a canonical path such as `orders[0].total` from this record
    pub fn lookup(&self, path: &TreePath) -> Option<ViewValue<'a>> {
        ViewValue::Record(*self).lookup(path)
    }

    /// Materialize this record with canonical names
    pub fn to_canonical_map(&self) -> Map<String, Value> {
        self.iter().map(|(name, value)| (name.to_string(), value.to_value())).collect()
    }

    // Stored value for a canonical name: under its alias, else verbatim. A
    // stored key that is an alias always reads as its canonical name, so it
    // never answers for itself.
    fn field(&self, name: &str) -> Option<&'a Value> {
        let record: &'a Map<String, Value> = self.record;
        if let Some(value) = self.table.alias_of(name).and_then(|alias| record.get(alias)) {
            return Some(value);
        }
        if self.table.canonical_of(name).is_some() {
            return None;
        }
        record.get(name)
    }
}

impl<'a> FieldAccess<'a> for RecordView<'a> {
    fn get_field(&self, name: &str) -> Option<ViewValue<'a>> {
        self.get(name)
    }

    fn has_field(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn field_names(&self) -> Vec<&'a str> {
        self.keys().collect()
    }

    fn to_canonical_map(&self) -> Map<String, Value> {
        RecordView::to_canonical_map(self)
    }
}

impl<'a> FieldAccess<'a> for &'a Map<String, Value> {
    fn get_field(&self, name: &str) -> Option<ViewValue<'a>> {
        let record: &'a Map<String, Value> = *self;
        record.get(name).map(ViewValue::Plain)
    }

    fn has_field(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn field_names(&self) -> Vec<&'a str> {
        let record: &'a Map<String, Value> = *self;
        record.keys().map(String::as_str).collect()
    }

    fn to_canonical_map(&self) -> Map<String, Value> {
        (*self).clone()
    }
}

impl<'a> ViewValue<'a> {
    /// Nested record view, if this is a record
    pub fn as_record(&self) -> Option<&RecordView<'a>> {
        match self {
            ViewValue::Record(view) => Some(view),
            _ => None,
        }
    }

    /// Materialized elements, if this is an array of records
    pub fn as_array(&self) -> Option<&[ViewValue<'a>]> {
        match self {
            ViewValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Raw value, if this is a primitive or untranslated subtree
    pub fn as_plain(&self) -> Option<&'a Value> {
        match self {
            ViewValue::Plain(value) => Some(*value),
            _ => None,
        }
    }

    /// Field of a record by canonical name
    pub fn get(&self, name: &str) -> Option<ViewValue<'a>> {
        match self {
            ViewValue::Record(view) => view.get(name),
            ViewValue::Plain(value) => {
                let value: &'a Value = *value;
                value.as_object()?.get(name).map(ViewValue::Plain)
            }
            ViewValue::Array(_) => None,
        }
    }

    /// Whether a field with this canonical name exists
    pub fn contains(&self, name: &str) -> bool {
        match self {
            ViewValue::Record(view) => view.contains(name),
            ViewValue::Plain(value) => value.as_object().is_some_and(|map| map.contains_key(name)),
            ViewValue::Array(_) => false,
        }
    }

    /// Follow a canonical path such as `[0].orders[1].total`
    pub fn lookup(&self, path: &TreePath) -> Option<ViewValue<'a>> {
        path.segments()
            .iter()
            .try_fold(self.clone(), |current, segment| match segment {
                PathSegment::Key(key) => current.get(key),
                PathSegment::Index(idx) => current.index(*idx),
            })
    }

    /// Element of an array by position
    pub fn index(&self, idx: usize) -> Option<ViewValue<'a>> {
        match self {
            ViewValue::Array(items) => items.get(idx).cloned(),
            ViewValue::Plain(value) => {
                let value: &'a Value = *value;
                value.as_array()?.get(idx).map(ViewValue::Plain)
            }
            ViewValue::Record(_) => None,
        }
    }

    /// Materialize with canonical names
    pub fn to_value(&self) -> Value {
        match self {
            ViewValue::Plain(value) => (*value).clone(),
            ViewValue::Record(view) => Value::Object(view.to_canonical_map()),
            ViewValue::Array(items) => Value::Array(items.iter().map(ViewValue::to_value).collect()),
        }
    }
}

impl PartialEq<Value> for ViewValue<'_> {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (ViewValue::Plain(value), other) => *value == other,
            (ViewValue::Record(view), Value::Object(map)) => {
                view.len() == map.len()
                    && view
                        .iter()
                        .all(|(name, value)| map.get(name).is_some_and(|expected| value == *expected))
            }
            (ViewValue::Array(items), Value::Array(expected)) => {
                items.len() == expected.len()
                    && items.iter().zip(expected).all(|(item, value)| item == value)
            }
            _ => false,
        }
    }
}

impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl Serialize for ViewValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ViewValue::Plain(value) => value.serialize(serializer),
            ViewValue::Record(view) => view.serialize(serializer),
            ViewValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

fn wrap<'a>(value: &'a Value, table: &'a KeyTable, depth: usize) -> ViewValue<'a> {
    if depth >= EXPAND_MAX_DEPTH {
        return ViewValue::Plain(value);
    }
    match value {
        Value::Object(record) => ViewValue::Record(RecordView::at_depth(record, table, depth)),
        Value::Array(items) if is_record_array(items) => ViewValue::Array(
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|record| ViewValue::Record(RecordView::at_depth(record, table, depth)))
                .collect(),
        ),
        other => ViewValue::Plain(other),
    }
}

/// View over envelope data: a record view, or an array of record views
pub fn view_tree<'a>(data: &'a Value, table: &'a KeyTable) -> ViewValue<'a> {
    wrap(data, table, 0)
}
