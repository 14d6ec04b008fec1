//! JKC Format - Core primitives for JSON Key Compaction
//!
//! This crate provides the wire-level building blocks for JKC with no I/O
//! dependencies. It includes:
//!
//! - Envelope field names and constants
//! - Key generators (alias sequences)
//! - The bidirectional key table
//! - REST and path-addressed envelopes plus their recognition predicates
//! - Tree paths in dot/bracket notation
//! - Error types

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod envelope;
pub mod error;
pub mod generator;
pub mod path;
pub mod table;

// Re-export commonly used types
pub use envelope::{is_envelope, is_path_envelope, Envelope, PathEnvelope, PathMeta};
pub use error::{JkcError, Result};
pub use generator::{KeyPattern, PrefixStyle};
pub use path::{PathSegment, TreePath};
pub use table::KeyTable;
