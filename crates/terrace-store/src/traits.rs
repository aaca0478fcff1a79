use terrace_layer::LayerRecord;
use terrace_types::LayerId;

use crate::error::StoreResult;

/// Persistent storage for layer records.
///
/// All implementations must satisfy these invariants:
/// - Records are immutable once written. Layer ids are content-derived, so
///   the same id always maps to the same record.
/// - Writing a record that already exists is a no-op.
/// - A record returned by `read` has been checked against its id.
/// - Records are never deleted through this interface.
/// - All I/O errors are propagated, never silently ignored.
pub trait LayerStore: Send + Sync {
    /// Read a layer record by id.
    ///
    /// Returns `Ok(None)` if the layer does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &LayerId) -> StoreResult<Option<LayerRecord>>;

    /// Write a layer record. Returns `true` if it was newly stored and
    /// `false` if a record with the same id was already present.
    fn write(&self, record: &LayerRecord) -> StoreResult<bool>;

    /// Check whether a layer exists in the store.
    fn exists(&self, id: &LayerId) -> StoreResult<bool>;

    /// All stored layer ids, sorted.
    fn layer_ids(&self) -> StoreResult<Vec<LayerId>>;

    /// Read multiple records in a batch.
    ///
    /// Default implementation calls `read()` for each id.
    fn read_batch(&self, ids: &[LayerId]) -> StoreResult<Vec<Option<LayerRecord>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }
}
