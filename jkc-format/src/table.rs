//! Bidirectional canonical name <-> alias table

use crate::error::{JkcError, Result};
use ahash::AHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Key table for one compression operation
///
/// Aliases are unique and each canonical name maps to at most one alias.
/// Entries keep assignment order, which is also the wire order
/// (`{alias: canonical, ...}`).
#[derive(Debug, Clone, Default)]
pub struct KeyTable {
    entries: Vec<(String, String)>,
    by_alias: AHashMap<String, usize>,
    by_canonical: AHashMap<String, usize>,
}

impl KeyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair; returns `false` and leaves the table untouched when either
    /// side is already present.
    pub fn insert(&mut self, canonical: impl Into<String>, alias: impl Into<String>) -> bool {
        let canonical = canonical.into();
        let alias = alias.into();
        if self.by_alias.contains_key(&alias) || self.by_canonical.contains_key(&canonical) {
            return false;
        }
        let idx = self.entries.len();
        self.by_alias.insert(alias.clone(), idx);
        self.by_canonical.insert(canonical.clone(), idx);
        self.entries.push((alias, canonical));
        true
    }

    /// Alias assigned to `canonical`, if any
    pub fn alias_of(&self, canonical: &str) -> Option<&str> {
        self.by_canonical
            .get(canonical)
            .map(|&idx| self.entries[idx].0.as_str())
    }

    /// Canonical name behind `alias`, if any
    pub fn canonical_of(&self, alias: &str) -> Option<&str> {
        self.by_alias
            .get(alias)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// Stored key for a canonical name (the alias, or the name itself when unmapped)
    pub fn stored_key<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.alias_of(canonical).unwrap_or(canonical)
    }

    /// Canonical name for a stored key (unmapped keys pass through)
    pub fn canonical_key<'a>(&'a self, stored: &'a str) -> &'a str {
        self.canonical_of(stored).unwrap_or(stored)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(alias, canonical)` pairs in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
    }

    /// Wire form: `{alias: canonical, ...}`
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(alias, canonical)| (alias.to_string(), Value::String(canonical.to_string())))
            .collect();
        Value::Object(map)
    }

    /// Parse the wire form, rejecting non-string entries and duplicate canonical names
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            JkcError::MalformedEnvelope(format!("table must be an object, found {}", type_name(value)))
        })?;
        let mut table = KeyTable::new();
        for (alias, canonical) in map {
            let canonical = canonical.as_str().ok_or_else(|| {
                JkcError::MalformedEnvelope(format!(
                    "table entry '{alias}' must map to a string, found {}",
                    type_name(canonical)
                ))
            })?;
            if !table.insert(canonical, alias.as_str()) {
                return Err(JkcError::MalformedEnvelope(format!(
                    "table maps '{canonical}' more than once"
                )));
            }
        }
        Ok(table)
    }
}

impl PartialEq for KeyTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for KeyTable {}

impl Serialize for KeyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (alias, canonical) in self.iter() {
            map.serialize_entry(alias, canonical)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeyTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = KeyTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of alias to canonical name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<KeyTable, A::Error> {
                let mut table = KeyTable::new();
                while let Some((alias, canonical)) = access.next_entry::<String, String>()? {
                    if !table.insert(canonical.clone(), alias.clone()) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate table entry '{alias}' -> '{canonical}'"
                        )));
                    }
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// Human-readable JSON type name
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
