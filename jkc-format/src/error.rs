//! Error types for JKC format

use thiserror::Error;

/// JKC error types
#[derive(Debug, Error)]
pub enum JkcError {
    /// Value claimed to be an envelope but is missing or mistypes a required field.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
    /// Envelope version is not supported by this decoder.
    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(u64),
    /// A tree path string could not be parsed.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path text as given
        path: String,
        /// Explanation of why the path is invalid
        reason: String,
    },
    /// A tree path does not locate a value in the document.
    #[error("Path not found: '{path}' (reached '{reached}')")]
    PathNotFound {
        /// Path that was requested
        path: String,
        /// Prefix of the path that could be navigated before failure
        reached: String,
    },
    /// Compression options are out of range or inconsistent.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    /// Configuration file could not be interpreted.
    #[error("Configuration error: {0}")]
    Config(String),
    /// I/O operation failed while reading or writing data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, JkcError>;
