use serde::{Deserialize, Serialize};

/// Default zstd level for pack payloads.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Configuration for pack export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// zstd compression level for layer payloads.
    pub compression_level: i32,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}
