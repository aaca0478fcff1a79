use std::fmt;

use terrace_labels::LabelError;
use terrace_layer::LayerError;
use terrace_pack::PackError;
use terrace_store::StoreError;
use terrace_types::TypeError;
use thiserror::Error;

/// Broad category of an [`Error`], for callers that only need to know what
/// kind of failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operation is not valid in the handle's current state, such as
    /// mutating a committed builder.
    InvalidState,
    /// The caller passed something that does not parse or resolve.
    MalformedInput,
    /// The storage backend failed.
    Io,
    /// A name is already taken.
    Conflict,
    /// Stored or transferred data failed an integrity check.
    Corrupt,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState => write!(f, "invalid state"),
            Self::MalformedInput => write!(f, "malformed input"),
            Self::Io => write!(f, "I/O failure"),
            Self::Conflict => write!(f, "conflict"),
            Self::Corrupt => write!(f, "corrupt data"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed layer id: {0}")]
    Type(#[from] TypeError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error("CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("named graph {0} has been deleted")]
    GraphDeleted(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Type(_) => ErrorKind::MalformedInput,
            Self::Layer(e) => layer_kind(e),
            Self::Store(e) => store_kind(e),
            Self::Label(e) => match e {
                LabelError::AlreadyExists { .. } => ErrorKind::Conflict,
                LabelError::InvalidName { .. } => ErrorKind::MalformedInput,
                LabelError::Corrupt { .. } | LabelError::Serialization(_) => ErrorKind::Corrupt,
                LabelError::Io(_) => ErrorKind::Io,
            },
            Self::Pack(e) => match e {
                PackError::InvalidMagic { .. }
                | PackError::UnsupportedVersion(_)
                | PackError::MissingLayer(_)
                | PackError::MissingAncestor { .. }
                | PackError::NotInPack(_) => ErrorKind::MalformedInput,
                PackError::ChecksumMismatch
                | PackError::CorruptEntry { .. }
                | PackError::CrcMismatch { .. }
                | PackError::DecompressionFailed(_) => ErrorKind::Corrupt,
                PackError::CompressionFailed(_) => ErrorKind::Io,
                PackError::Layer(e) => layer_kind(e),
                PackError::Store(e) => store_kind(e),
            },
            Self::Csv(e) if e.is_io_error() => ErrorKind::Io,
            Self::Csv(_) => ErrorKind::MalformedInput,
            Self::GraphDeleted(_) => ErrorKind::InvalidState,
        }
    }
}

fn layer_kind(e: &LayerError) -> ErrorKind {
    match e {
        LayerError::AlreadyCommitted => ErrorKind::InvalidState,
        LayerError::UnknownId { .. } | LayerError::ParentMismatch { .. } => {
            ErrorKind::MalformedInput
        }
        LayerError::ContentMismatch { .. }
        | LayerError::InvalidRecord { .. }
        | LayerError::Serialization(_) => ErrorKind::Corrupt,
    }
}

fn store_kind(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::Io(_) => ErrorKind::Io,
        StoreError::CorruptFile { .. } | StoreError::CorruptLayer { .. } => ErrorKind::Corrupt,
        StoreError::Layer(e) => layer_kind(e),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
