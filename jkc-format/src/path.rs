//! Tree paths in dot/bracket notation (`data.users[0].orders`)
//!
//! Keys that are empty or contain `.`, `[` or `]` are written as quoted
//! bracket segments (`data["a.b"]`), with `"` and `\` escaped by a backslash.

use crate::error::{JkcError, Result};
use crate::table::KeyTable;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// One step of a tree path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object field by name
    Key(String),
    /// Array element by position
    Index(usize),
}

/// Root-relative location of a value inside a JSON tree
///
/// The empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath {
    segments: SmallVec<[PathSegment; 8]>,
}

impl TreePath {
    /// The root path
    pub fn root() -> Self {
        Self::default()
    }

    /// Path extended by an object field
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(key.into()));
        next
    }

    /// Path extended by an array index
    pub fn child_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    /// Path segments from the root
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `self` equals `ancestor` or lies underneath it
    pub fn starts_with(&self, ancestor: &TreePath) -> bool {
        self.segments.len() >= ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    /// Remainder of this path below `prefix`, if `prefix` is an ancestor
    pub fn strip_prefix(&self, prefix: &TreePath) -> Option<TreePath> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(TreePath {
            segments: self.segments[prefix.segments.len()..].iter().cloned().collect(),
        })
    }

    /// Value at this path, using key segments verbatim
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| step(current, segment, None))
    }

    /// Mutable value at this path, using key segments verbatim
    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| step_mut(current, segment, None))
    }

    /// Value at this path inside renamed data
    ///
    /// Each key segment is tried verbatim first, then through its alias in `table`.
    pub fn get_aliased<'a>(&self, root: &'a Value, table: &KeyTable) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| step(current, segment, Some(table)))
    }

    /// Mutable counterpart of [`TreePath::get_aliased`]
    pub fn get_aliased_mut<'a>(&self, root: &'a mut Value, table: &KeyTable) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| step_mut(current, segment, Some(table)))
    }

    /// Like [`TreePath::get`] but reports how far navigation got
    pub fn locate<'a>(&self, root: &'a Value) -> Result<&'a Value> {
        let mut current = root;
        let mut reached = TreePath::root();
        for segment in &self.segments {
            current = step(current, segment, None).ok_or_else(|| JkcError::PathNotFound {
                path: self.to_string(),
                reached: reached.to_string(),
            })?;
            reached.segments.push(segment.clone());
        }
        Ok(current)
    }
}

fn step<'a>(current: &'a Value, segment: &PathSegment, table: Option<&KeyTable>) -> Option<&'a Value> {
    match (segment, current) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key.as_str()).or_else(|| {
            let alias = table?.alias_of(key)?;
            map.get(alias)
        }),
        (PathSegment::Index(idx), Value::Array(items)) => items.get(*idx),
        _ => None,
    }
}

fn step_mut<'a>(
    current: &'a mut Value,
    segment: &PathSegment,
    table: Option<&KeyTable>,
) -> Option<&'a mut Value> {
    match (segment, current) {
        (PathSegment::Key(key), Value::Object(map)) => {
            let stored = if map.contains_key(key.as_str()) {
                key.as_str()
            } else {
                table?.alias_of(key)?
            };
            map.get_mut(stored)
        }
        (PathSegment::Index(idx), Value::Array(items)) => items.get_mut(*idx),
        _ => None,
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if needs_quoting(key) => write_quoted(f, key)?,
                PathSegment::Key(key) if idx == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']'])
}

fn write_quoted(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    f.write_str("[\"")?;
    for ch in key.chars() {
        if ch == '"' || ch == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    f.write_str("\"]")
}

#[derive(Clone, Copy, PartialEq)]
enum Last {
    Start,
    Key,
    Bracket,
    Dot,
}

impl FromStr for TreePath {
    type Err = JkcError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| JkcError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut path = TreePath::root();
        let mut key = String::new();
        let mut last = Last::Start;
        let mut chars = s.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    match last {
                        Last::Start | Last::Dot => return Err(invalid("empty key segment")),
                        Last::Key => path.segments.push(PathSegment::Key(std::mem::take(&mut key))),
                        Last::Bracket => {}
                    }
                    last = Last::Dot;
                }
                '[' => {
                    match last {
                        Last::Dot => return Err(invalid("empty key segment before '['")),
                        Last::Key => path.segments.push(PathSegment::Key(std::mem::take(&mut key))),
                        Last::Start | Last::Bracket => {}
                    }
                    if chars.next_if_eq(&'"').is_some() {
                        let mut quoted = String::new();
                        loop {
                            match chars.next() {
                                Some('"') => break,
                                Some('\\') => match chars.next() {
                                    Some(escaped) => quoted.push(escaped),
                                    None => return Err(invalid("unterminated quoted key")),
                                },
                                Some(other) => quoted.push(other),
                                None => return Err(invalid("unterminated quoted key")),
                            }
                        }
                        if chars.next() != Some(']') {
                            return Err(invalid("expected ']' after quoted key"));
                        }
                        path.segments.push(PathSegment::Key(quoted));
                        last = Last::Bracket;
                        continue;
                    }
                    let mut digits = String::new();
                    let mut closed = false;
                    for d in chars.by_ref() {
                        if d == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(d);
                    }
                    if !closed {
                        return Err(invalid("unterminated '['"));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("array index must be a non-negative integer"))?;
                    path.segments.push(PathSegment::Index(index));
                    last = Last::Bracket;
                }
                ']' => return Err(invalid("unexpected ']'")),
                other => {
                    if last == Last::Bracket {
                        return Err(invalid("expected '.' or '[' after ']'"));
                    }
                    key.push(other);
                    last = Last::Key;
                }
            }
        }

        match last {
            Last::Dot => Err(invalid("trailing '.'")),
            Last::Key => {
                path.segments.push(PathSegment::Key(key));
                Ok(path)
            }
            Last::Start | Last::Bracket => Ok(path),
        }
    }
}

impl Serialize for TreePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TreePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
