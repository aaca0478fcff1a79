use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use terrace_labels::{DirectoryLabelStore, InMemoryLabelStore, LabelStore};
use terrace_layer::{HandleGuard, HandleKind, Layer};
use terrace_pack::{ImportReport, PackConfig};
use terrace_store::{
    DirectoryLayerStore, InMemoryLayerStore, LayerStore, StoreConfig, StoreError,
};
use terrace_types::LayerId;
use tracing::{debug, info};

use crate::builder::StoreLayerBuilder;
use crate::error::Result;
use crate::named_graph::NamedGraph;

/// Handle to a triple store.
///
/// Cloning is cheap and shares the backend. Layers handed out by a store stay
/// valid after every store handle is gone.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    pack: PackConfig,
    _handle: HandleGuard,
}

struct StoreInner {
    layers: Box<dyn LayerStore>,
    labels: Box<dyn LabelStore>,
    location: Option<PathBuf>,
    /// Layers materialized so far, so shared ancestors are loaded once.
    cache: RwLock<HashMap<LayerId, Layer>>,
}

impl Store {
    /// A store that lives only in memory.
    pub fn open_memory() -> Self {
        Self::from_backends(
            Box::new(InMemoryLayerStore::new()),
            Box::new(InMemoryLabelStore::new()),
            None,
        )
    }

    /// Open (or create) a store rooted at `path` with the default config.
    pub fn open_directory(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_directory_with_config(path, StoreConfig::default())
    }

    pub fn open_directory_with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let layers = DirectoryLayerStore::open(path, config.clone())?;
        let labels = DirectoryLabelStore::open(path, config)?;
        info!(path = %path.display(), "opened directory store");
        Ok(Self::from_backends(
            Box::new(layers),
            Box::new(labels),
            Some(path.to_path_buf()),
        ))
    }

    /// A store over caller-supplied backends.
    pub fn from_backends(
        layers: Box<dyn LayerStore>,
        labels: Box<dyn LabelStore>,
        location: Option<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                layers,
                labels,
                location,
                cache: RwLock::new(HashMap::new()),
            }),
            pack: PackConfig::default(),
            _handle: HandleGuard::new(HandleKind::Store),
        }
    }

    /// Use `config` for packs exported through this handle.
    pub fn with_pack_config(mut self, config: PackConfig) -> Self {
        self.pack = config;
        self
    }

    /// Root directory for a directory store, `None` in memory.
    pub fn location(&self) -> Option<&Path> {
        self.inner.location.as_deref()
    }

    // ---- Layers ----

    /// A builder for a new base layer. Committing it persists the layer here.
    pub fn create_base_layer(&self) -> StoreLayerBuilder {
        StoreLayerBuilder::base(self.clone())
    }

    /// A builder for a child of `parent`.
    pub fn open_write(&self, parent: &Layer) -> StoreLayerBuilder {
        StoreLayerBuilder::child(self.clone(), parent.clone())
    }

    /// Load a layer and its ancestor chain.
    ///
    /// Returns `Ok(None)` if the store has no layer with this id. A stored
    /// layer whose ancestors are missing is corrupt.
    pub fn get_layer_by_id(&self, id: &LayerId) -> Result<Option<Layer>> {
        if let Some(layer) = self.cached(id) {
            return Ok(Some(layer));
        }
        let Some(record) = self.inner.layers.read(id)? else {
            return Ok(None);
        };

        // Read records down to the first cached ancestor or the base, then
        // materialize them from the bottom up.
        let mut pending = vec![record];
        let mut parent = None;
        while let Some((child, parent_id)) = pending
            .last()
            .and_then(|r| r.parent.map(|p| (r.id, p)))
        {
            if let Some(layer) = self.cached(&parent_id) {
                parent = Some(layer);
                break;
            }
            let record = self.inner.layers.read(&parent_id)?.ok_or_else(|| {
                StoreError::CorruptLayer {
                    id: child,
                    reason: format!("parent {parent_id} is missing from the store"),
                }
            })?;
            pending.push(record);
        }
        debug!(layer = %id, loaded = pending.len(), "materializing layer");
        while let Some(record) = pending.pop() {
            let layer = Layer::from_record(record, parent.take())?;
            self.remember(&layer);
            parent = Some(layer);
        }
        Ok(parent)
    }

    /// Like [`Store::get_layer_by_id`], taking the 40-character hex form.
    pub fn get_layer_by_hex(&self, id: &str) -> Result<Option<Layer>> {
        let id: LayerId = id.parse()?;
        self.get_layer_by_id(&id)
    }

    /// Ids of every layer in the store, sorted.
    pub fn layer_ids(&self) -> Result<Vec<LayerId>> {
        Ok(self.inner.layers.layer_ids()?)
    }

    /// Write `layer` and any of its ancestors the store does not yet hold.
    pub fn write_layer(&self, layer: &Layer) -> Result<()> {
        let mut missing = Vec::new();
        for l in layer.chain() {
            if self.cached(&l.id()).is_some() || self.inner.layers.exists(&l.id())? {
                break;
            }
            missing.push(l);
        }
        for l in missing.iter().rev() {
            if self.inner.layers.write(&l.to_record())? {
                debug!(layer = %l.id(), "stored layer");
            }
            self.remember(l);
        }
        Ok(())
    }

    /// A new base layer holding the same effective triples as `layer`.
    pub fn squash(&self, layer: &Layer) -> Result<Layer> {
        let mut builder = self.create_base_layer();
        for t in layer.string_triples() {
            builder.add_string_triple(t)?;
        }
        let squashed = builder.commit()?;
        info!(
            from = %layer.id(),
            to = %squashed.id(),
            depth = layer.depth(),
            triples = squashed.total_triple_count(),
            "squashed layer"
        );
        Ok(squashed)
    }

    // ---- Named graphs ----

    /// Create an empty named graph. Fails with a conflict if the name exists.
    pub fn create_named_graph(&self, name: &str) -> Result<NamedGraph> {
        let label = self.inner.labels.create_label(name)?;
        info!(graph = name, "created named graph");
        Ok(NamedGraph::new(self.clone(), label))
    }

    pub fn open_named_graph(&self, name: &str) -> Result<Option<NamedGraph>> {
        let label = self.inner.labels.get_label(name)?;
        Ok(label.map(|label| NamedGraph::new(self.clone(), label)))
    }

    /// Remove a named graph. Its layers stay in the store.
    pub fn delete_named_graph(&self, name: &str) -> Result<bool> {
        let deleted = self.inner.labels.delete_label(name)?;
        if deleted {
            info!(graph = name, "deleted named graph");
        }
        Ok(deleted)
    }

    /// Names of all named graphs, sorted.
    pub fn named_graphs(&self) -> Result<Vec<String>> {
        Ok(self.inner.labels.labels()?)
    }

    // ---- Packs ----

    /// Pack the given layers and all their ancestors.
    pub fn export_layers(&self, ids: &[LayerId]) -> Result<Vec<u8>> {
        Ok(terrace_pack::export(self.inner.layers.as_ref(), ids, &self.pack)?)
    }

    /// Import the given layers from a pack, filling in missing ancestors.
    ///
    /// Importing layers the store already holds is a no-op.
    pub fn import_layers(&self, pack: &[u8], ids: &[LayerId]) -> Result<ImportReport> {
        Ok(terrace_pack::import(self.inner.layers.as_ref(), pack, ids)?)
    }

    /// Import every layer in a pack.
    pub fn import_all(&self, pack: &[u8]) -> Result<ImportReport> {
        Ok(terrace_pack::import_all(self.inner.layers.as_ref(), pack)?)
    }

    // ---- Internals ----

    pub(crate) fn labels(&self) -> &dyn LabelStore {
        self.inner.labels.as_ref()
    }

    fn cached(&self, id: &LayerId) -> Option<Layer> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn remember(&self, layer: &Layer) {
        self.inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(layer.id(), layer.clone());
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("location", &self.inner.location)
            .field(
                "cached_layers",
                &self.inner.cache.read().unwrap_or_else(PoisonError::into_inner).len(),
            )
            .finish()
    }
}
