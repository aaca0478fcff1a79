use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use terrace_layer::LayerRecord;
use terrace_types::LayerId;

use crate::error::StoreResult;
use crate::traits::LayerStore;

/// In-memory, HashMap-based layer store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` and
/// cloned on read and write.
pub struct InMemoryLayerStore {
    layers: RwLock<HashMap<LayerId, LayerRecord>>,
}

impl InMemoryLayerStore {
    pub fn new() -> Self {
        Self {
            layers: RwLock::new(HashMap::new()),
        }
    }

    /// Number of layers currently stored.
    pub fn len(&self) -> usize {
        self.layers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.read().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

impl Default for InMemoryLayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore for InMemoryLayerStore {
    fn read(&self, id: &LayerId) -> StoreResult<Option<LayerRecord>> {
        let map = self.layers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(id).cloned())
    }

    fn write(&self, record: &LayerRecord) -> StoreResult<bool> {
        record.verify()?;
        let mut map = self.layers.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(&record.id) {
            return Ok(false);
        }
        map.insert(record.id, record.clone());
        Ok(true)
    }

    fn exists(&self, id: &LayerId) -> StoreResult<bool> {
        let map = self.layers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.contains_key(id))
    }

    fn layer_ids(&self) -> StoreResult<Vec<LayerId>> {
        let map = self.layers.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<LayerId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryLayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLayerStore")
            .field("layer_count", &self.len())
            .finish()
    }
}
