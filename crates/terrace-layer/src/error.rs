//! Error types for layer and builder operations.

use terrace_types::LayerId;
use thiserror::Error;

/// Errors that can occur while building, loading or querying layers.
///
/// Absent results (an unknown string, a triple that is not present) are
/// never errors; they surface as `None` or `false`.
#[derive(Debug, Error)]
pub enum LayerError {
    /// An id triple referenced an id unknown to the whole ancestor chain.
    #[error("unknown {kind} id {id}")]
    UnknownId { kind: &'static str, id: u64 },

    /// The builder was already committed; it accepts no further changes.
    #[error("builder has already been committed")]
    AlreadyCommitted,

    /// A layer record names a different parent than the one supplied.
    #[error("parent mismatch: record expects {expected:?}, got {actual:?}")]
    ParentMismatch {
        expected: Option<LayerId>,
        actual: Option<LayerId>,
    },

    /// A layer record's content does not hash to its stated id.
    #[error("layer {id} failed content verification (computed {computed})")]
    ContentMismatch { id: LayerId, computed: LayerId },

    /// A layer record is structurally invalid.
    #[error("invalid layer record {id}: {reason}")]
    InvalidRecord { id: LayerId, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;
