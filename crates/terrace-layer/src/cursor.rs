//! Restartable triple cursors.
//!
//! A [`TripleCursor`] walks one view of a layer in key order. It holds a
//! clone of the layer and a position (the last key it examined) rather than a
//! borrowed iterator, so it can be stored, reset and moved freely. Each step
//! re-seeks the underlying ordered sets just past the position.
//!
//! In [`ViewMode::Effective`] the cursor merges the additions of every layer
//! in the chain and filters out keys that are not present after delta
//! resolution. A triple added, removed and re-added is reported once.

use std::iter::FusedIterator;

use terrace_types::IdTriple;

use crate::handles::{HandleGuard, HandleKind};
use crate::index::{prefix_range, IndexKey, IndexOrder};
use crate::layer::Layer;

/// Which triples a cursor reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Triples present in the layer.
    Effective,
    /// Triples the layer itself added.
    Additions,
    /// Triples the layer itself removed.
    Removals,
}

/// Cursor over one view of a layer, restricted to a key prefix.
pub struct TripleCursor {
    layer: Layer,
    mode: ViewMode,
    order: IndexOrder,
    low: IndexKey,
    high: IndexKey,
    position: Option<IndexKey>,
    exhausted: bool,
    _handle: HandleGuard,
}

impl TripleCursor {
    pub(crate) fn new(layer: Layer, mode: ViewMode, order: IndexOrder, prefix: &[u64]) -> Self {
        let (low, high) = prefix_range(prefix);
        Self {
            layer,
            mode,
            order,
            low,
            high,
            position: None,
            exhausted: false,
            _handle: HandleGuard::new(HandleKind::Cursor),
        }
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn order(&self) -> IndexOrder {
        self.order
    }

    /// Restart from the beginning of the range.
    pub fn reset(&mut self) {
        self.position = None;
        self.exhausted = false;
    }

    /// Release the cursor. Equivalent to dropping it.
    pub fn close(self) {}

    /// Skip every remaining key that shares the first `len` components with
    /// the key most recently returned.
    pub fn skip_prefix(&mut self, len: usize) {
        if let Some(mut key) = self.position {
            for component in key.iter_mut().skip(len) {
                *component = u64::MAX;
            }
            self.position = Some(key);
        }
    }

    /// Advance to the next reported key in this cursor's ordering.
    pub(crate) fn next_key(&mut self) -> Option<IndexKey> {
        if self.exhausted {
            return None;
        }
        loop {
            let after = self.position;
            let candidate = match self.mode {
                ViewMode::Additions => {
                    self.layer
                        .additions()
                        .next_key(self.order, self.low, after, self.high)
                }
                ViewMode::Removals => {
                    self.layer
                        .removals()
                        .next_key(self.order, self.low, after, self.high)
                }
                ViewMode::Effective => self
                    .layer
                    .chain()
                    .filter_map(|l| l.additions().next_key(self.order, self.low, after, self.high))
                    .min(),
            };
            let Some(key) = candidate else {
                self.exhausted = true;
                return None;
            };
            self.position = Some(key);
            if self.mode != ViewMode::Effective
                || self.layer.triple_exists(self.order.triple(key))
            {
                return Some(key);
            }
        }
    }
}

impl Iterator for TripleCursor {
    type Item = IdTriple;

    fn next(&mut self) -> Option<IdTriple> {
        let order = self.order;
        self.next_key().map(|key| order.triple(key))
    }
}

impl FusedIterator for TripleCursor {}

impl std::fmt::Debug for TripleCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripleCursor")
            .field("layer", &self.layer.id())
            .field("mode", &self.mode)
            .field("order", &self.order)
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
