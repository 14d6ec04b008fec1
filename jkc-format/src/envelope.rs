//! Wire envelopes pairing a key table with renamed data
//!
//! REST form:
//! `{"marker": true, "version": 1, "table": {...}, "data": <tree>, "pattern": "alpha"}`
//!
//! Path-addressed form:
//! `{"data": <tree>, "meta": {"version": 1, "table": {...}, "paths": ["data.users", ...]}}`
//!
//! A path-addressed envelope made from a response also carries the response's
//! other top-level fields (`errors`, `extensions`) verbatim beside `data`.

use crate::constants::{
    ENVELOPE_VERSION, FIELD_DATA, FIELD_MARKER, FIELD_META, FIELD_PATHS, FIELD_PATTERN,
    FIELD_TABLE, FIELD_VERSION,
};
use crate::error::{JkcError, Result};
use crate::path::TreePath;
use crate::table::{type_name, KeyTable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// REST envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Always `true` on the wire
    pub marker: bool,
    /// Envelope version
    pub version: u64,
    /// Alias table shared by the whole tree
    pub table: KeyTable,
    /// Renamed record or array of records
    pub data: Value,
    /// Name of the generator that produced the aliases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Envelope {
    /// Build a current-version envelope
    pub fn new(table: KeyTable, data: Value, pattern: Option<String>) -> Self {
        Self {
            marker: true,
            version: ENVELOPE_VERSION,
            table,
            data,
            pattern,
        }
    }

    /// Strictly parse an envelope
    ///
    /// Fails with [`JkcError::MalformedEnvelope`] when the marker, table or data
    /// is missing or mistyped, and [`JkcError::UnsupportedVersion`] for other versions.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            JkcError::MalformedEnvelope(format!("expected an object, found {}", type_name(value)))
        })?;

        if obj.get(FIELD_MARKER) != Some(&Value::Bool(true)) {
            return Err(JkcError::MalformedEnvelope(format!(
                "'{FIELD_MARKER}' must be true"
            )));
        }
        let version = parse_version(obj)?;
        let table = KeyTable::from_json(require(obj, FIELD_TABLE)?)?;
        let data = require(obj, FIELD_DATA)?.clone();
        let pattern = match obj.get(FIELD_PATTERN) {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(JkcError::MalformedEnvelope(format!(
                    "'{FIELD_PATTERN}' must be a string, found {}",
                    type_name(other)
                )))
            }
        };

        Ok(Self {
            marker: true,
            version,
            table,
            data,
            pattern,
        })
    }

    /// Wire form
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(FIELD_MARKER.to_string(), Value::Bool(self.marker));
        obj.insert(FIELD_VERSION.to_string(), Value::from(self.version));
        obj.insert(FIELD_TABLE.to_string(), self.table.to_json());
        obj.insert(FIELD_DATA.to_string(), self.data.clone());
        if let Some(pattern) = &self.pattern {
            obj.insert(FIELD_PATTERN.to_string(), Value::String(pattern.clone()));
        }
        Value::Object(obj)
    }
}

/// Metadata block of a path-addressed envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMeta {
    /// Envelope version
    pub version: u64,
    /// Alias table shared by every located array
    pub table: KeyTable,
    /// Location of each compressed array, relative to the envelope root
    pub paths: Vec<TreePath>,
}

/// Path-addressed envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEnvelope {
    /// Response payload with located arrays renamed
    pub data: Value,
    /// Table and paths
    pub meta: PathMeta,
    /// Other top-level response fields, carried verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PathEnvelope {
    /// Build a current-version path-addressed envelope
    pub fn new(data: Value, table: KeyTable, paths: Vec<TreePath>) -> Self {
        Self {
            data,
            meta: PathMeta {
                version: ENVELOPE_VERSION,
                table,
                paths,
            },
            extra: Map::new(),
        }
    }

    /// Attach top-level response fields carried beside `data`
    ///
    /// Fails with [`JkcError::MalformedEnvelope`] when a field would shadow
    /// `data` or `meta`.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Result<Self> {
        if let Some(field) = [FIELD_DATA, FIELD_META]
            .into_iter()
            .find(|field| extra.contains_key(*field))
        {
            return Err(JkcError::MalformedEnvelope(format!(
                "response field '{field}' is reserved by the envelope"
            )));
        }
        self.extra = extra;
        Ok(self)
    }

    /// Strictly parse a path-addressed envelope
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            JkcError::MalformedEnvelope(format!("expected an object, found {}", type_name(value)))
        })?;
        let data = require(obj, FIELD_DATA)?.clone();
        let meta = require(obj, FIELD_META)?.as_object().ok_or_else(|| {
            JkcError::MalformedEnvelope(format!("'{FIELD_META}' must be an object"))
        })?;
        let version = parse_version(meta)?;
        let table = KeyTable::from_json(require(meta, FIELD_TABLE)?)?;
        let paths = require(meta, FIELD_PATHS)?
            .as_array()
            .ok_or_else(|| JkcError::MalformedEnvelope(format!("'{FIELD_PATHS}' must be an array")))?
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .ok_or_else(|| {
                        JkcError::MalformedEnvelope(format!(
                            "path entries must be strings, found {}",
                            type_name(entry)
                        ))
                    })?
                    .parse::<TreePath>()
            })
            .collect::<Result<Vec<_>>>()?;
        let extra = obj
            .iter()
            .filter(|(key, _)| key.as_str() != FIELD_DATA && key.as_str() != FIELD_META)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            data,
            meta: PathMeta {
                version,
                table,
                paths,
            },
            extra,
        })
    }

    /// Wire form
    pub fn to_value(&self) -> Value {
        let mut meta = Map::new();
        meta.insert(FIELD_VERSION.to_string(), Value::from(self.meta.version));
        meta.insert(FIELD_TABLE.to_string(), self.meta.table.to_json());
        meta.insert(
            FIELD_PATHS.to_string(),
            Value::Array(
                self.meta
                    .paths
                    .iter()
                    .map(|p| Value::String(p.to_string()))
                    .collect(),
            ),
        );

        let mut obj = Map::new();
        obj.insert(FIELD_DATA.to_string(), self.data.clone());
        obj.insert(FIELD_META.to_string(), Value::Object(meta));
        obj.extend(self.extra.iter().map(|(key, value)| (key.clone(), value.clone())));
        Value::Object(obj)
    }
}

/// Whether `value` looks like a REST envelope. Never fails.
pub fn is_envelope(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => {
            obj.get(FIELD_MARKER) == Some(&Value::Bool(true))
                && obj.contains_key(FIELD_VERSION)
                && obj.contains_key(FIELD_TABLE)
                && obj.contains_key(FIELD_DATA)
        }
        None => false,
    }
}

/// Whether `value` looks like a path-addressed envelope. Never fails.
pub fn is_path_envelope(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    if !obj.contains_key(FIELD_DATA) {
        return false;
    }
    match obj.get(FIELD_META).and_then(Value::as_object) {
        Some(meta) => {
            meta.contains_key(FIELD_VERSION)
                && meta.contains_key(FIELD_TABLE)
                && meta.contains_key(FIELD_PATHS)
        }
        None => false,
    }
}

fn require<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    obj.get(field)
        .ok_or_else(|| JkcError::MalformedEnvelope(format!("missing '{field}'")))
}

fn parse_version(obj: &Map<String, Value>) -> Result<u64> {
    let version = require(obj, FIELD_VERSION)?.as_u64().ok_or_else(|| {
        JkcError::MalformedEnvelope(format!("'{FIELD_VERSION}' must be a non-negative integer"))
    })?;
    if version != ENVELOPE_VERSION {
        return Err(JkcError::UnsupportedVersion(version));
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> KeyTable {
        let mut table = KeyTable::new();
        table.insert("firstName", "a");
        table
    }

    #[test]
    fn test_envelope_wire_shape() {
        let env = Envelope::new(table(), json!([{"a": "John"}]), Some("alpha".to_string()));
        let wire = env.to_value();
        assert_eq!(
            wire,
            json!({
                "marker": true,
                "version": 1,
                "table": {"a": "firstName"},
                "data": [{"a": "John"}],
                "pattern": "alpha"
            })
        );
        assert_eq!(serde_json::to_value(&env).unwrap(), wire);
        assert!(is_envelope(&wire));
        assert_eq!(Envelope::from_value(&wire).unwrap(), env);
    }

    #[test]
    fn test_envelope_recognition_is_safe() {
        assert!(!is_envelope(&json!(null)));
        assert!(!is_envelope(&json!([1, 2])));
        assert!(!is_envelope(&json!({"marker": "yes", "version": 1, "table": {}, "data": []})));
        assert!(!is_envelope(&json!({"marker": true, "version": 1, "data": []})));
        assert!(!is_envelope(&json!({"firstName": "John"})));
    }

    #[test]
    fn test_envelope_parse_reports_missing_fields() {
        let missing_table = json!({"marker": true, "version": 1, "data": []});
        assert!(matches!(
            Envelope::from_value(&missing_table),
            Err(JkcError::MalformedEnvelope(msg)) if msg.contains("table")
        ));

        let missing_data = json!({"marker": true, "version": 1, "table": {}});
        assert!(matches!(
            Envelope::from_value(&missing_data),
            Err(JkcError::MalformedEnvelope(msg)) if msg.contains("data")
        ));

        let no_marker = json!({"version": 1, "table": {}, "data": []});
        assert!(matches!(
            Envelope::from_value(&no_marker),
            Err(JkcError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_envelope_rejects_future_version() {
        let wire = json!({"marker": true, "version": 2, "table": {}, "data": []});
        assert!(matches!(
            Envelope::from_value(&wire),
            Err(JkcError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_path_envelope_round_trip() {
        let paths = vec!["data.users".parse().unwrap(), "data.users[0].orders".parse().unwrap()];
        let env = PathEnvelope::new(json!({"users": []}), table(), paths);
        let wire = env.to_value();
        assert_eq!(
            wire["meta"]["paths"],
            json!(["data.users", "data.users[0].orders"])
        );
        assert!(is_path_envelope(&wire));
        assert!(!is_envelope(&wire));
        assert_eq!(PathEnvelope::from_value(&wire).unwrap(), env);
        assert_eq!(serde_json::to_value(&env).unwrap(), wire);
    }

    #[test]
    fn test_path_envelope_carries_response_fields() {
        let mut extra = Map::new();
        extra.insert("errors".to_string(), json!([{"message": "partial"}]));
        let env = PathEnvelope::new(json!({"users": []}), table(), Vec::new())
            .with_extra(extra)
            .unwrap();

        let wire = env.to_value();
        assert_eq!(wire["errors"], json!([{"message": "partial"}]));
        assert!(is_path_envelope(&wire));
        assert_eq!(PathEnvelope::from_value(&wire).unwrap(), env);
        assert_eq!(serde_json::to_value(&env).unwrap(), wire);

        let mut clash = Map::new();
        clash.insert("meta".to_string(), json!({}));
        assert!(matches!(
            PathEnvelope::new(json!({}), table(), Vec::new()).with_extra(clash),
            Err(JkcError::MalformedEnvelope(msg)) if msg.contains("meta")
        ));
    }

    #[test]
    fn test_path_envelope_recognition_is_safe() {
        assert!(!is_path_envelope(&json!({"data": {}})));
        assert!(!is_path_envelope(&json!({"data": {}, "meta": "x"})));
        assert!(!is_path_envelope(&json!({"data": {}, "meta": {"version": 1, "table": {}}})));
        assert!(!is_path_envelope(&json!("data")));
    }

    #[test]
    fn test_path_envelope_rejects_bad_paths() {
        let wire = json!({"data": {}, "meta": {"version": 1, "table": {}, "paths": [3]}});
        assert!(matches!(
            PathEnvelope::from_value(&wire),
            Err(JkcError::MalformedEnvelope(_))
        ));
        let wire = json!({"data": {}, "meta": {"version": 1, "table": {}, "paths": ["a..b"]}});
        assert!(matches!(
            PathEnvelope::from_value(&wire),
            Err(JkcError::InvalidPath { .. })
        ));
    }
}
