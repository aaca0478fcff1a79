use terrace_layer::LayerError;
use terrace_store::StoreError;
use terrace_types::LayerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid pack magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("pack checksum mismatch")]
    ChecksumMismatch,

    #[error("corrupt pack entry at offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    #[error("CRC32 mismatch for layer {id}")]
    CrcMismatch { id: LayerId },

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("layer not found in store: {0}")]
    MissingLayer(LayerId),

    #[error("layer {layer} needs ancestor {ancestor}, which is neither in the pack nor in the store")]
    MissingAncestor { layer: LayerId, ancestor: LayerId },

    #[error("layer not found in pack: {0}")]
    NotInPack(LayerId),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type PackResult<T> = Result<T, PackError>;
