use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use terrace_sdk::{PackConfig, StoreConfig};

/// Settings read from the `--config` TOML file.
///
/// ```toml
/// [store]
/// sync_mode = "every_write"
///
/// [pack]
/// compression_level = 9
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub store: StoreConfig,
    pub pack: PackConfig,
}

impl CliConfig {
    /// Load from `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrace_sdk::SyncMode;

    #[test]
    fn defaults_without_file() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrace.toml");
        std::fs::write(&path, "[store]\nsync_mode = \"every_write\"\n").unwrap();
        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.store.sync_mode, SyncMode::EveryWrite);
        assert_eq!(config.pack, PackConfig::default());
    }

    #[test]
    fn bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrace.toml");
        std::fs::write(&path, "[pack]\ncompression_level = \"high\"\n").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());
    }
}
