use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of bytes in a layer id.
pub const LAYER_ID_BYTES: usize = 20;

/// Number of hex characters in the textual form of a layer id.
pub const LAYER_ID_HEX_LEN: usize = LAYER_ID_BYTES * 2;

/// Content-derived identifier of a layer.
///
/// A `LayerId` is a 160-bit digest of a layer's content (its parent linkage,
/// dictionaries and triple deltas). Identical content always produces the
/// same `LayerId`, so independently built identical layers deduplicate.
///
/// The textual form is exactly 40 lowercase hex characters. The binary form
/// used across handle boundaries is five big-endian `u32` words.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId([u8; LAYER_ID_BYTES]);

impl LayerId {
    /// Create a `LayerId` from a pre-computed digest.
    pub const fn from_hash(hash: [u8; LAYER_ID_BYTES]) -> Self {
        Self(hash)
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; LAYER_ID_BYTES] {
        &self.0
    }

    /// Hex-encoded string representation (40 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 40-character hex string.
    ///
    /// Input of the wrong length is rejected, never truncated or padded.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != LAYER_ID_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: LAYER_ID_HEX_LEN,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; LAYER_ID_BYTES];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The id as five big-endian `u32` words.
    pub fn to_words(&self) -> [u32; 5] {
        let mut words = [0u32; 5];
        for (i, chunk) in self.0.chunks_exact(4).enumerate() {
            words[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words
    }

    /// Rebuild an id from five big-endian `u32` words.
    pub fn from_words(words: [u32; 5]) -> Self {
        let mut arr = [0u8; LAYER_ID_BYTES];
        for (i, word) in words.iter().enumerate() {
            arr[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
        }
        Self(arr)
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.short_hex())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for LayerId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; LAYER_ID_BYTES]> for LayerId {
    fn from(bytes: [u8; LAYER_ID_BYTES]) -> Self {
        Self(bytes)
    }
}

impl From<LayerId> for [u8; LAYER_ID_BYTES] {
    fn from(id: LayerId) -> Self {
        id.0
    }
}

impl From<[u32; 5]> for LayerId {
    fn from(words: [u32; 5]) -> Self {
        Self::from_words(words)
    }
}
