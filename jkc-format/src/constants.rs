//! Constants and wire field names for JKC envelopes

/// Envelope version written by this implementation.
pub const ENVELOPE_VERSION: u64 = 1;

/// REST envelope field carrying the `true` marker.
pub const FIELD_MARKER: &str = "marker";
/// Envelope field carrying the format version.
pub const FIELD_VERSION: &str = "version";
/// Envelope field carrying the alias table.
pub const FIELD_TABLE: &str = "table";
/// Envelope field carrying the renamed tree.
pub const FIELD_DATA: &str = "data";
/// REST envelope field naming the key generator.
pub const FIELD_PATTERN: &str = "pattern";
/// Path-addressed envelope field carrying version, table and paths.
pub const FIELD_META: &str = "meta";
/// Path-addressed metadata field listing located arrays.
pub const FIELD_PATHS: &str = "paths";

/// Default minimum key length eligible for aliasing.
pub const DEFAULT_MIN_KEY_LENGTH: usize = 3;
/// Default recursion ceiling for key discovery and transform.
pub const DEFAULT_MAX_DEPTH: usize = 10;
/// Fixed recursion ceiling for expansion, independent of compress options.
pub const EXPAND_MAX_DEPTH: usize = 10;
/// Hard ceiling on any configured depth (recursion is stack based).
pub const HARD_MAX_DEPTH: usize = 64;
/// Default minimum array length located by the path-addressed variant.
pub const DEFAULT_MIN_ARRAY_LENGTH: usize = 2;

/// Digits used by the alphanumeric generator per letter block.
pub const ALPHANUMERIC_BLOCK: usize = 9;
