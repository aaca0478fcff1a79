//! Error types for label operations.

use thiserror::Error;

/// Errors that can occur during label operations.
///
/// A missing label is not an error; lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum LabelError {
    /// A label with this name already exists.
    #[error("label already exists: {name}")]
    AlreadyExists { name: String },

    /// The label name is invalid.
    #[error("invalid label name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A stored label file failed validation.
    #[error("corrupt label {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based label operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for label operations.
pub type Result<T> = std::result::Result<T, LabelError>;
