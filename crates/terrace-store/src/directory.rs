//! Directory-backed layer store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/layers/<40 hex chars>.layer
//! ```
//!
//! Each file holds one bincode-encoded [`LayerRecord`] inside the framing
//! described in [`crate::frame`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use terrace_layer::LayerRecord;
use terrace_types::LayerId;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::frame;
use crate::traits::LayerStore;

/// Magic bytes of a layer file.
pub const LAYER_MAGIC: &[u8; 4] = b"TRLY";

const LAYER_EXTENSION: &str = "layer";

/// Layer store keeping one file per layer.
#[derive(Debug)]
pub struct DirectoryLayerStore {
    root: PathBuf,
    layers_dir: PathBuf,
    config: StoreConfig,
}

impl DirectoryLayerStore {
    /// Open (or create) a layer store rooted at `root`.
    pub fn open(root: &Path, config: StoreConfig) -> StoreResult<Self> {
        let layers_dir = root.join("layers");
        fs::create_dir_all(&layers_dir)?;
        debug!(root = %root.display(), "opened directory layer store");
        Ok(Self {
            root: root.to_path_buf(),
            layers_dir,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn layer_path(&self, id: &LayerId) -> PathBuf {
        self.layers_dir
            .join(format!("{}.{LAYER_EXTENSION}", id.to_hex()))
    }
}

impl LayerStore for DirectoryLayerStore {
    fn read(&self, id: &LayerId) -> StoreResult<Option<LayerRecord>> {
        let path = self.layer_path(id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let payload = frame::decode(LAYER_MAGIC, &data).map_err(|reason| {
            StoreError::CorruptFile {
                path: path.clone(),
                reason,
            }
        })?;
        let record = LayerRecord::from_bytes(payload).map_err(|e| StoreError::CorruptLayer {
            id: *id,
            reason: e.to_string(),
        })?;
        if record.id != *id {
            return Err(StoreError::CorruptLayer {
                id: *id,
                reason: format!("file holds layer {}", record.id),
            });
        }
        record.verify().map_err(|e| StoreError::CorruptLayer {
            id: *id,
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    fn write(&self, record: &LayerRecord) -> StoreResult<bool> {
        record.verify()?;
        let path = self.layer_path(&record.id);
        if path.exists() {
            return Ok(false);
        }
        let payload = record.to_bytes()?;
        let contents = frame::encode(LAYER_MAGIC, &payload);
        frame::write_atomic(&path, &contents, self.config.sync_mode)?;
        debug!(layer = %record.id, bytes = contents.len(), "stored layer");
        Ok(true)
    }

    fn exists(&self, id: &LayerId) -> StoreResult<bool> {
        Ok(self.layer_path(id).is_file())
    }

    fn layer_ids(&self) -> StoreResult<Vec<LayerId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.layers_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LAYER_EXTENSION) {
                continue;
            }
            let parsed = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::parse::<LayerId>);
            match parsed {
                Some(Ok(id)) => ids.push(id),
                _ => warn!(path = %path.display(), "ignoring unrecognised file in layer directory"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
