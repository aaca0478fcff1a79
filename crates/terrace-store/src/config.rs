use serde::{Deserialize, Serialize};

/// Flush/sync strategy for directory-backed stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` every file and its directory after each write (safest,
    /// highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    #[default]
    OsDefault,
}

/// Configuration for directory-backed stores.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Sync/flush strategy.
    pub sync_mode: SyncMode,
}

impl StoreConfig {
    /// Configuration that fsyncs every write.
    pub fn durable() -> Self {
        Self {
            sync_mode: SyncMode::EveryWrite,
        }
    }
}
