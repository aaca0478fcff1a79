//! Live-handle diagnostics.
//!
//! Every long-lived handle (stores, layers, builders, named graphs, cursors)
//! holds a [`HandleGuard`] that bumps a per-kind atomic counter on creation
//! and decrements it on drop. The counts are purely observational and have no
//! effect on correctness; they exist so embedders can detect leaked handles.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The kind of handle being tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Store,
    Layer,
    Builder,
    NamedGraph,
    Cursor,
}

impl HandleKind {
    pub const ALL: [HandleKind; 5] = [
        HandleKind::Store,
        HandleKind::Layer,
        HandleKind::Builder,
        HandleKind::NamedGraph,
        HandleKind::Cursor,
    ];

    fn slot(self) -> usize {
        match self {
            Self::Store => 0,
            Self::Layer => 1,
            Self::Builder => 2,
            Self::NamedGraph => 3,
            Self::Cursor => 4,
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Layer => write!(f, "layer"),
            Self::Builder => write!(f, "builder"),
            Self::NamedGraph => write!(f, "named_graph"),
            Self::Cursor => write!(f, "cursor"),
        }
    }
}

/// Per-kind live handle counters.
pub struct HandleRegistry {
    counts: [AtomicUsize; 5],
}

static GLOBAL: HandleRegistry = HandleRegistry::new();

impl HandleRegistry {
    pub const fn new() -> Self {
        Self {
            counts: [
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
            ],
        }
    }

    /// The process-wide registry used by all handles.
    pub fn global() -> &'static HandleRegistry {
        &GLOBAL
    }

    /// Register a new live handle of `kind`.
    pub fn guard(&'static self, kind: HandleKind) -> HandleGuard {
        self.counts[kind.slot()].fetch_add(1, Ordering::Relaxed);
        HandleGuard {
            registry: self,
            kind,
        }
    }

    /// Number of live handles of `kind`.
    pub fn live(&self, kind: HandleKind) -> usize {
        self.counts[kind.slot()].load(Ordering::Relaxed)
    }

    /// Snapshot of all counters.
    pub fn snapshot(&self) -> Vec<(HandleKind, usize)> {
        HandleKind::ALL
            .iter()
            .map(|kind| (*kind, self.live(*kind)))
            .collect()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, count) in self.snapshot() {
            map.entry(&kind, &count);
        }
        map.finish()
    }
}

/// RAII token for one live handle; dropping it releases the count.
pub struct HandleGuard {
    registry: &'static HandleRegistry,
    kind: HandleKind,
}

impl HandleGuard {
    /// Register a handle in the global registry.
    pub fn new(kind: HandleKind) -> Self {
        HandleRegistry::global().guard(kind)
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }
}

impl Clone for HandleGuard {
    fn clone(&self) -> Self {
        self.registry.guard(self.kind)
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.registry.counts[self.kind.slot()].fetch_sub(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for HandleGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandleGuard({})", self.kind)
    }
}

/// Number of live handles of `kind` in the global registry.
pub fn live_handles(kind: HandleKind) -> usize {
    HandleRegistry::global().live(kind)
}
