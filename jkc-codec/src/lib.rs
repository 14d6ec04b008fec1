//! JKC Codec - Key compaction engines
//!
//! This crate provides the algorithms behind JKC:
//!
//! - Key collection over record trees
//! - Deterministic namespace (alias table) construction
//! - Compress/expand tree rewriting bounded by depth
//! - Lazy read-through views over compressed records
//! - Path-addressed compression of several arrays inside one response

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod collector;
pub mod namespace;
pub mod paths;
pub mod transform;
pub mod view;

// Re-export commonly used types
pub use jkc_format::{
    is_envelope, is_path_envelope, Envelope, JkcError, KeyPattern, KeyTable, PathEnvelope,
    PathSegment, PrefixStyle, Result, TreePath,
};

// Re-export our own types
pub use codec::{compress, expand, expand_value, is_compressible, view};
pub use collector::{collect_keys, observed_keys};
pub use namespace::{build_table, build_table_with};
pub use paths::{compress_paths, expand_paths, locate_arrays, view_paths, ArrayPredicate, PathOptions};
pub use transform::{compress_tree, expand_tree, Direction, Rewriter};
pub use view::{view_tree, FieldAccess, RecordView, ViewValue};

use jkc_format::constants::{DEFAULT_MAX_DEPTH, DEFAULT_MIN_KEY_LENGTH, HARD_MAX_DEPTH};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How far compression reaches below the top-level records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestedHandling {
    /// Recurse fully, up to `max_depth`
    #[default]
    Deep,
    /// Top-level record keys only
    Shallow,
    /// Recurse into nested arrays of records but not into single nested records
    Arrays,
    /// Explicit recursion depth
    Depth(usize),
}

impl fmt::Display for NestedHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestedHandling::Deep => f.write_str("deep"),
            NestedHandling::Shallow => f.write_str("shallow"),
            NestedHandling::Arrays => f.write_str("arrays"),
            NestedHandling::Depth(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for NestedHandling {
    type Err = JkcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deep" => Ok(NestedHandling::Deep),
            "shallow" => Ok(NestedHandling::Shallow),
            "arrays" => Ok(NestedHandling::Arrays),
            other => other.parse::<usize>().map(NestedHandling::Depth).map_err(|_| {
                JkcError::InvalidOption(format!(
                    "nested handling must be deep, shallow, arrays or a depth, got '{other}'"
                ))
            }),
        }
    }
}

/// Compression options
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Names shorter than this are never aliased unless listed in `include_keys`
    pub min_key_length: usize,
    /// Recursion ceiling for key discovery and transform
    pub max_depth: usize,
    /// Alias generator
    pub key_pattern: KeyPattern,
    /// Nested recursion policy
    pub nested_handling: NestedHandling,
    /// Drop names not present on every sibling record of a level
    pub homogeneous_only: bool,
    /// Names never aliased
    pub exclude_keys: HashSet<String>,
    /// Names always considered regardless of length
    pub include_keys: HashSet<String>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            min_key_length: DEFAULT_MIN_KEY_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            key_pattern: KeyPattern::Alpha,
            nested_handling: NestedHandling::Deep,
            homogeneous_only: false,
            exclude_keys: HashSet::new(),
            include_keys: HashSet::new(),
        }
    }
}

impl CompressOptions {
    /// Recursion ceiling after resolving `nested_handling`
    pub fn effective_depth(&self) -> usize {
        match self.nested_handling {
            NestedHandling::Deep | NestedHandling::Arrays => self.max_depth,
            NestedHandling::Shallow => 1,
            NestedHandling::Depth(n) => n,
        }
    }

    /// Whether single nested records (not in arrays) are recursed into
    pub fn descends_into_records(&self) -> bool {
        !matches!(
            self.nested_handling,
            NestedHandling::Shallow | NestedHandling::Arrays
        )
    }

    /// Whether `key` may receive an alias
    pub fn is_eligible(&self, key: &str) -> bool {
        if self.exclude_keys.contains(key) {
            return false;
        }
        self.include_keys.contains(key) || key.chars().count() >= self.min_key_length
    }

    /// Validate depth settings against the hard ceiling
    pub fn validate(&self) -> Result<()> {
        if self.max_depth > HARD_MAX_DEPTH {
            return Err(JkcError::InvalidOption(format!(
                "max_depth {} exceeds hard limit {}",
                self.max_depth, HARD_MAX_DEPTH
            )));
        }
        if self.effective_depth() > HARD_MAX_DEPTH {
            return Err(JkcError::InvalidOption(format!(
                "nested depth {} exceeds hard limit {}",
                self.effective_depth(),
                HARD_MAX_DEPTH
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_depth() {
        let mut opts = CompressOptions::default();
        assert_eq!(opts.effective_depth(), 10);
        assert!(opts.descends_into_records());

        opts.nested_handling = NestedHandling::Shallow;
        assert_eq!(opts.effective_depth(), 1);
        assert!(!opts.descends_into_records());

        opts.nested_handling = NestedHandling::Arrays;
        assert_eq!(opts.effective_depth(), 10);
        assert!(!opts.descends_into_records());

        opts.nested_handling = NestedHandling::Depth(3);
        assert_eq!(opts.effective_depth(), 3);
        assert!(opts.descends_into_records());
    }

    #[test]
    fn test_eligibility() {
        let mut opts = CompressOptions {
            min_key_length: 4,
            ..CompressOptions::default()
        };
        assert!(opts.is_eligible("name"));
        assert!(!opts.is_eligible("age"));

        opts.include_keys.insert("id".to_string());
        opts.exclude_keys.insert("name".to_string());
        assert!(opts.is_eligible("id"));
        assert!(!opts.is_eligible("name"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let mut opts = CompressOptions::default();
        opts.include_keys.insert("status".to_string());
        opts.exclude_keys.insert("status".to_string());
        assert!(!opts.is_eligible("status"));
    }

    #[test]
    fn test_validate_depth_limits() {
        assert!(CompressOptions::default().validate().is_ok());

        let opts = CompressOptions {
            max_depth: 100,
            ..CompressOptions::default()
        };
        assert!(matches!(opts.validate(), Err(JkcError::InvalidOption(_))));

        let opts = CompressOptions {
            nested_handling: NestedHandling::Depth(65),
            ..CompressOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_nested_handling_parse() {
        assert_eq!("deep".parse::<NestedHandling>().unwrap(), NestedHandling::Deep);
        assert_eq!("arrays".parse::<NestedHandling>().unwrap(), NestedHandling::Arrays);
        assert_eq!("4".parse::<NestedHandling>().unwrap(), NestedHandling::Depth(4));
        assert!("sideways".parse::<NestedHandling>().is_err());
        assert_eq!(NestedHandling::Depth(2).to_string(), "2");
    }
}
