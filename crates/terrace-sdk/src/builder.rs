use terrace_layer::{Layer, LayerBuilder, LayerError};
use terrace_types::{IdTriple, LayerId, StringTriple};
use tracing::info;

use crate::error::Result;
use crate::store::Store;

/// A [`LayerBuilder`] bound to a store: committing persists the new layer.
///
/// Not thread-safe; callers serialize access to one open builder.
#[derive(Debug)]
pub struct StoreLayerBuilder {
    store: Store,
    builder: LayerBuilder,
}

impl StoreLayerBuilder {
    pub(crate) fn base(store: Store) -> Self {
        Self {
            store,
            builder: LayerBuilder::base(),
        }
    }

    pub(crate) fn child(store: Store, parent: Layer) -> Self {
        Self {
            store,
            builder: LayerBuilder::child(parent),
        }
    }

    pub fn parent(&self) -> Option<&Layer> {
        self.builder.parent()
    }

    pub fn parent_id(&self) -> Option<LayerId> {
        self.builder.parent_id()
    }

    pub fn committed(&self) -> bool {
        self.builder.committed()
    }

    pub fn add_id_triple(&mut self, t: IdTriple) -> Result<bool> {
        Ok(self.builder.add_id_triple(t)?)
    }

    pub fn remove_id_triple(&mut self, t: IdTriple) -> Result<bool> {
        Ok(self.builder.remove_id_triple(t)?)
    }

    pub fn add_string_triple(&mut self, t: StringTriple) -> Result<bool> {
        Ok(self.builder.add_string_triple(t)?)
    }

    pub fn remove_string_triple(&mut self, t: &StringTriple) -> Result<bool> {
        Ok(self.builder.remove_string_triple(t)?)
    }

    pub fn add_string_node_triple(&mut self, s: &str, p: &str, o: &str) -> Result<bool> {
        Ok(self.builder.add_string_node_triple(s, p, o)?)
    }

    pub fn add_string_value_triple(&mut self, s: &str, p: &str, o: &str) -> Result<bool> {
        Ok(self.builder.add_string_value_triple(s, p, o)?)
    }

    pub fn remove_string_node_triple(&mut self, s: &str, p: &str, o: &str) -> Result<bool> {
        Ok(self.builder.remove_string_node_triple(s, p, o)?)
    }

    pub fn remove_string_value_triple(&mut self, s: &str, p: &str, o: &str) -> Result<bool> {
        Ok(self.builder.remove_string_value_triple(s, p, o)?)
    }

    /// Replay `delta`'s own additions and removals on top of this builder.
    pub fn apply_delta(&mut self, delta: &Layer) -> Result<()> {
        Ok(self.builder.apply_delta(delta)?)
    }

    /// Make the result hold exactly the triples present in `target`.
    pub fn apply_diff(&mut self, target: &Layer) -> Result<()> {
        Ok(self.builder.apply_diff(target)?)
    }

    /// Commit the pending changes and persist the new layer.
    ///
    /// A second call fails with an invalid-state error, as does a call after
    /// a commit whose persistence failed.
    pub fn commit(&mut self) -> Result<Layer> {
        if self.builder.committed() {
            return Err(LayerError::AlreadyCommitted.into());
        }
        let layer = self.builder.commit()?;
        self.store.write_layer(&layer)?;
        info!(
            layer = %layer.id(),
            parent = ?layer.parent_id(),
            triples = layer.total_triple_count(),
            "committed layer to store"
        );
        Ok(layer)
    }
}
