use std::path::PathBuf;

use terrace_layer::LayerError;
use terrace_types::LayerId;

/// Errors from layer store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored file failed framing or checksum validation.
    #[error("corrupt file {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    /// A stored layer decoded but does not match the id it was stored under.
    #[error("corrupt layer {id}: {reason}")]
    CorruptLayer { id: LayerId, reason: String },

    /// A layer record could not be encoded or decoded.
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
