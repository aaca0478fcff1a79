//! Directory-backed label store.
//!
//! Each label lives in `<root>/labels/<name>.label` as a JSON document inside
//! the store's checksummed framing. Updates replace the file atomically.
//! Every read-check-write runs under an exclusive OS file lock on
//! `<root>/labels/.lock`, so compare-and-swap holds across handles and
//! processes sharing the directory. `<root>/labels/.generation` holds the
//! next label generation.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use terrace_store::{frame, StoreConfig};
use terrace_types::LayerId;
use tracing::{debug, warn};

use crate::error::{LabelError, Result};
use crate::names::validate_label_name;
use crate::traits::LabelStore;
use crate::types::Label;

/// Magic bytes of a label file.
pub const LABEL_MAGIC: &[u8; 4] = b"TRLB";

/// Magic bytes of the generation counter file.
pub const GENERATION_MAGIC: &[u8; 4] = b"TRGN";

const LABEL_EXTENSION: &str = "label";
const LOCK_FILE: &str = ".lock";
const GENERATION_FILE: &str = ".generation";

/// Label store keeping one file per label.
#[derive(Debug)]
pub struct DirectoryLabelStore {
    dir: PathBuf,
    config: StoreConfig,
}

impl DirectoryLabelStore {
    /// Open (or create) a label store rooted at `root`.
    pub fn open(root: &Path, config: StoreConfig) -> Result<Self> {
        let dir = root.join("labels");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, config })
    }

    /// Take the directory-wide write lock. It is released when the returned
    /// file is dropped.
    fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    /// Hand out the next generation. Call with the lock held.
    fn next_generation(&self) -> Result<u64> {
        let path = self.dir.join(GENERATION_FILE);
        let next = match fs::read(&path) {
            Ok(data) => {
                let corrupt = |reason: String| LabelError::Corrupt {
                    name: GENERATION_FILE.to_string(),
                    reason,
                };
                let payload = frame::decode(GENERATION_MAGIC, &data).map_err(corrupt)?;
                serde_json::from_slice::<u64>(payload).map_err(|e| corrupt(e.to_string()))?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        let payload = serde_json::to_vec(&(next + 1))
            .map_err(|e| LabelError::Serialization(e.to_string()))?;
        frame::write_atomic(
            &path,
            &frame::encode(GENERATION_MAGIC, &payload),
            self.config.sync_mode,
        )?;
        Ok(next)
    }

    fn label_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{LABEL_EXTENSION}"))
    }

    fn read_file(&self, name: &str) -> Result<Option<Label>> {
        if validate_label_name(name).is_err() {
            return Ok(None);
        }
        let data = match fs::read(self.label_path(name)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let corrupt = |reason: String| LabelError::Corrupt {
            name: name.to_string(),
            reason,
        };
        let payload = frame::decode(LABEL_MAGIC, &data).map_err(corrupt)?;
        let label: Label =
            serde_json::from_slice(payload).map_err(|e| corrupt(e.to_string()))?;
        if label.name != name {
            return Err(corrupt(format!("file holds label {:?}", label.name)));
        }
        Ok(Some(label))
    }

    fn write_file(&self, label: &Label) -> Result<()> {
        let payload =
            serde_json::to_vec(label).map_err(|e| LabelError::Serialization(e.to_string()))?;
        let contents = frame::encode(LABEL_MAGIC, &payload);
        frame::write_atomic(&self.label_path(&label.name), &contents, self.config.sync_mode)?;
        debug!(
            label = %label.name,
            layer = ?label.layer,
            version = label.version,
            "wrote label"
        );
        Ok(())
    }
}

impl LabelStore for DirectoryLabelStore {
    fn create_label(&self, name: &str) -> Result<Label> {
        validate_label_name(name)?;
        let _lock = self.lock()?;
        if self.label_path(name).exists() {
            return Err(LabelError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let label = Label::created(name, self.next_generation()?);
        self.write_file(&label)?;
        Ok(label)
    }

    fn get_label(&self, name: &str) -> Result<Option<Label>> {
        self.read_file(name)
    }

    fn set_label(&self, expected: &Label, layer: Option<LayerId>) -> Result<Option<Label>> {
        let _lock = self.lock()?;
        let Some(current) = self.read_file(&expected.name)? else {
            return Ok(None);
        };
        if !current.matches(expected) {
            debug!(
                label = %expected.name,
                expected = expected.version,
                actual = current.version,
                "label moved; update refused"
            );
            return Ok(None);
        }
        let next = current.with_layer(layer);
        self.write_file(&next)?;
        Ok(Some(next))
    }

    fn force_set_label(&self, expected: &Label, layer: Option<LayerId>) -> Result<Option<Label>> {
        let _lock = self.lock()?;
        let Some(current) = self.read_file(&expected.name)? else {
            return Ok(None);
        };
        if current.generation != expected.generation {
            return Ok(None);
        }
        let next = current.with_layer(layer);
        self.write_file(&next)?;
        Ok(Some(next))
    }

    fn delete_label(&self, name: &str) -> Result<bool> {
        if validate_label_name(name).is_err() {
            return Ok(false);
        }
        let _lock = self.lock()?;
        Ok(frame::remove(&self.label_path(name), self.config.sync_mode)?)
    }

    fn labels(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LABEL_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(name) if validate_label_name(name).is_ok() => names.push(name.to_string()),
                _ => warn!(path = %path.display(), "ignoring unrecognised file in label directory"),
            }
        }
        names.sort();
        Ok(names)
    }
}
