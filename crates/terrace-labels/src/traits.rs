//! The [`LabelStore`] trait defining the label storage interface.

use terrace_types::LayerId;

use crate::error::Result;
use crate::types::Label;

/// Storage backend for named-graph labels.
///
/// Implementations must be thread-safe (`Send + Sync`). Updates are
/// linearizable across every handle on the same backing storage: a guarded
/// update succeeds only if no other update landed since the caller observed
/// the label. Generations are never reused within a store.
pub trait LabelStore: Send + Sync {
    /// Create a label with no head.
    ///
    /// Fails with `AlreadyExists` if the name is taken.
    fn create_label(&self, name: &str) -> Result<Label>;

    /// Read a label by name. Returns `Ok(None)` if it does not exist.
    fn get_label(&self, name: &str) -> Result<Option<Label>>;

    /// Point a label at `layer` if it still [matches](Label::matches)
    /// `expected`.
    ///
    /// Returns the updated label, or `Ok(None)` if the label changed since
    /// `expected` was read or no longer exists.
    fn set_label(&self, expected: &Label, layer: Option<LayerId>) -> Result<Option<Label>>;

    /// Point a label at `layer` regardless of its current version.
    ///
    /// Returns `Ok(None)` if no label of `expected`'s name and generation
    /// exists.
    fn force_set_label(&self, expected: &Label, layer: Option<LayerId>) -> Result<Option<Label>>;

    /// Delete a label. Returns `Ok(true)` if it existed.
    fn delete_label(&self, name: &str) -> Result<bool>;

    /// All label names, sorted.
    fn labels(&self) -> Result<Vec<String>>;
}
